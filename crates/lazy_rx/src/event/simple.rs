use crate::completion::Completion;
use crate::disposable::Disposable;
use crate::error::{Error, Result};
use crate::observable::Observable;
use crate::observer::Observer;
use crate::subject::{Subject, SubjectCore};
use std::fmt;
use std::sync::Arc;

const KIND: &str = "SimpleEvent";

/// Broadcast signal without a stored value.
///
/// Fires reach the observers subscribed at that moment; late subscribers never
/// see past fires. A late subscriber of a completed event receives only the
/// completion.
pub struct SimpleEvent<T> {
    core: Arc<SubjectCore<T>>,
}

impl<T> Clone for SimpleEvent<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T> SimpleEvent<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            core: SubjectCore::new(KIND),
        }
    }

    /// Push `value` to the current observers
    pub fn fire(&self, value: T) -> Result<()> {
        self.core.next(value)
    }
}

impl<T> SimpleEvent<T> {
    pub fn has_observers(&self) -> bool {
        self.core.has_observers()
    }

    pub fn observer_count(&self) -> usize {
        self.core.observer_count()
    }

    pub fn is_completed(&self) -> bool {
        self.core.is_completed()
    }

    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }

    /// Dispose, completing current observers first
    pub fn dispose(&self) {
        self.dispose_with(true);
    }

    pub fn dispose_with(&self, call_on_completed: bool) {
        if self.core.dispose(call_on_completed) {
            tracing::trace!(call_on_completed, "simple event disposed");
        }
    }
}

impl SimpleEvent<()> {
    /// Fire a payload-less event
    pub fn trigger(&self) -> Result<()> {
        self.fire(())
    }
}

impl<T> Default for SimpleEvent<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Subject<T> for SimpleEvent<T>
where
    T: Clone + Send + 'static,
{
    fn on_next(&self, value: T) -> Result<()> {
        self.fire(value)
    }

    fn on_error(&self, error: Error) -> Result<()> {
        self.core.error(error).map(|_| ())
    }

    fn on_completed(&self, completion: Completion) -> Result<()> {
        self.core.complete(completion).map(|_| ())
    }
}

impl<T> Observable<T> for SimpleEvent<T>
where
    T: Clone + Send + 'static,
{
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        self.core.subscribe(&observer, None)
    }
}

impl<T> fmt::Debug for SimpleEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleEvent")
            .field("observers", &self.core.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disposable::DisposeBag;
    use crate::observable::ObservableExt;
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let event = SimpleEvent::<&'static str>::new();
        event.fire("early").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = event.subscribe_fn(move |v| sink.lock().unwrap().push(v)).unwrap();
        event.fire("late").unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), ["late"]);
    }

    #[test]
    fn test_trigger_unit_event() {
        let event = SimpleEvent::<()>::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        let _sub = event.subscribe_fn(move |()| *c.lock().unwrap() += 1).unwrap();
        event.trigger().unwrap();
        event.trigger().unwrap();
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn test_completed_event_completes_late_subscriber_without_value() {
        let event = SimpleEvent::<i32>::new();
        event.on_completed(Completion::Success).unwrap();
        event.fire(1).unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let (n, c) = (events.clone(), events.clone());
        event
            .subscribe_with(
                move |v| n.lock().unwrap().push(format!("next {v}")),
                |_| {},
                move |done: Completion| c.lock().unwrap().push(format!("done {done}")),
            )
            .unwrap();
        assert_eq!(events.lock().unwrap().as_slice(), ["done Success"]);
    }

    #[test]
    fn test_dispose_completes_observers() {
        let event = SimpleEvent::<i32>::new();
        let completed = Arc::new(Mutex::new(false));
        let c = completed.clone();
        let sub = event
            .subscribe_with(|_| {}, |_| {}, move |_| *c.lock().unwrap() = true)
            .unwrap();
        event.dispose();
        assert!(*completed.lock().unwrap());
        assert!(sub.is_disposed());
        assert!(event.fire(1).unwrap_err().is_disposed());
    }

    #[test]
    fn test_dispose_without_completion_releases_observers_outside_the_lock() {
        let event = SimpleEvent::<i32>::new();
        let bag = DisposeBag::new();
        let inner = event.subscribe_fn(|_| {}).unwrap().add_to(&bag);

        // Only the event keeps `owner` alive; dropping it drops the bag
        let owner = Observer::from_fn(move |_: i32| {
            let _ = bag.len();
        });
        drop(event.subscribe(owner).unwrap());

        let (tx, rx) = mpsc::channel();
        let handle = event.clone();
        std::thread::spawn(move || {
            handle.dispose_with(false);
            let _ = tx.send(());
        });
        assert!(
            rx.recv_timeout(Duration::from_secs(5)).is_ok(),
            "dispose_with(false) deadlocked"
        );
        assert!(inner.is_disposed());
        assert!(event.is_disposed());
    }

    #[test]
    fn test_subscribing_an_observer_twice_leaves_no_node_behind() {
        let event = SimpleEvent::<i32>::new();
        let observer = Observer::from_fn(|_: i32| {});
        event.subscribe(observer.clone()).unwrap();

        let err = event.subscribe(observer.clone()).unwrap_err();
        assert!(matches!(err, Error::AlreadyAssigned));
        assert!(observer.is_disposed());
        assert_eq!(event.observer_count(), 0);
    }
}
