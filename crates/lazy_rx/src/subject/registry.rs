//! Shared observer registry and terminal state of a subject

use super::list::{NodeKey, ObserverList, Snapshot};
use crate::completion::Completion;
use crate::disposable::{self, Disposable};
use crate::error::{Error, Result};
use crate::observer::Observer;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

enum Terminal {
    Running,
    Completed(Completion),
    Disposed,
}

struct State<T> {
    terminal: Terminal,
    observers: ObserverList<T>,
}

/// Registry behind every subject.
///
/// The lock guards registration and the terminal state only; observers are
/// always invoked on a snapshot with the lock released, so a callback may
/// subscribe, unsubscribe, push or dispose on the same subject.
pub(crate) struct SubjectCore<T> {
    kind: &'static str,
    state: Mutex<State<T>>,
}

impl<T> SubjectCore<T> {
    /// `kind` names the subject in [`Error::ObjectDisposed`]
    pub fn new(kind: &'static str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            state: Mutex::new(State {
                terminal: Terminal::Running,
                observers: ObserverList::new(),
            }),
        })
    }

    pub fn disposed_error(&self) -> Error {
        Error::ObjectDisposed(self.kind)
    }

    pub fn ensure_not_disposed(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(self.disposed_error());
        }
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state.lock().terminal, Terminal::Disposed)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state.lock().terminal, Terminal::Completed(_))
    }

    pub fn has_observers(&self) -> bool {
        !self.state.lock().observers.is_empty()
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }

    /// Register `observer`.
    ///
    /// `replay` produces a value delivered before registration. On a subject
    /// that already completed, the observer receives the replay value (for a
    /// successful completion) and the stored completion, and is not registered.
    pub fn subscribe(
        self: &Arc<Self>,
        observer: &Arc<Observer<T>>,
        replay: Option<&dyn Fn() -> T>,
    ) -> Result<Arc<dyn Disposable>>
    where
        T: 'static,
    {
        if let Some(completion) = self.completion()? {
            if completion.is_success() {
                if let Some(replay) = replay {
                    observer.on_next(replay());
                }
            }
            observer.on_completed(completion);
            return Ok(disposable::empty());
        }

        if let Some(replay) = replay {
            observer.on_next(replay());
        }
        if observer.is_disposed() {
            return Ok(disposable::empty());
        }

        let mut state = self.state.lock();
        let completed = match &state.terminal {
            Terminal::Running => None,
            Terminal::Completed(completion) => Some(completion.clone()),
            Terminal::Disposed => return Err(self.disposed_error()),
        };
        if let Some(completion) = completed {
            // Completed while the replay value was being delivered
            drop(state);
            observer.on_completed(completion);
            return Ok(disposable::empty());
        }

        let key = state.observers.push_back(Arc::clone(observer));
        drop(state);
        Ok(Arc::new(ObserverNode {
            subject: Mutex::new(Some(Arc::downgrade(self))),
            key,
        }))
    }

    /// Deliver a value to the current observers.
    ///
    /// A completed subject ignores the value.
    pub fn next(&self, value: T) -> Result<()>
    where
        T: Clone,
    {
        let Some(observers) = self.running_snapshot()? else {
            return Ok(());
        };
        broadcast(observers, value);
        Ok(())
    }

    /// Deliver an error without terminating; returns whether the subject was running
    pub fn error(&self, error: Error) -> Result<bool> {
        let Some(observers) = self.running_snapshot()? else {
            return Ok(false);
        };
        for observer in observers {
            observer.on_error(error.clone());
        }
        Ok(true)
    }

    /// Terminate the stream; returns whether this call completed it
    pub fn complete(&self, completion: Completion) -> Result<bool> {
        let observers = {
            let mut state = self.state.lock();
            match state.terminal {
                Terminal::Running => {}
                Terminal::Completed(_) => return Ok(false),
                Terminal::Disposed => return Err(self.disposed_error()),
            }
            state.terminal = Terminal::Completed(completion.clone());
            state.observers.take_all()
        };
        for observer in observers {
            observer.on_completed(completion.clone());
        }
        Ok(true)
    }

    /// Release all observers; returns whether this call disposed the subject.
    ///
    /// With `notify`, observers of a running subject first receive a
    /// successful completion.
    pub fn dispose(&self, notify: bool) -> bool {
        let (observers, notify) = {
            let mut state = self.state.lock();
            let notify = match state.terminal {
                Terminal::Disposed => return false,
                Terminal::Running => notify,
                Terminal::Completed(_) => false,
            };
            state.terminal = Terminal::Disposed;
            (state.observers.take_all(), notify)
        };
        // Released observers may run drop code that calls back into this subject
        tracing::trace!(
            kind = self.kind,
            released = observers.len(),
            notify,
            "subject disposed"
        );
        if notify {
            for observer in observers {
                observer.on_completed(Completion::Success);
            }
        }
        true
    }

    /// The stored completion; `None` while running
    pub fn completion(&self) -> Result<Option<Completion>> {
        match &self.state.lock().terminal {
            Terminal::Running => Ok(None),
            Terminal::Completed(completion) => Ok(Some(completion.clone())),
            Terminal::Disposed => Err(self.disposed_error()),
        }
    }

    fn remove(&self, key: NodeKey) {
        let removed = {
            let mut state = self.state.lock();
            match state.terminal {
                Terminal::Running => state.observers.remove(key),
                _ => None,
            }
        };
        drop(removed);
    }

    fn running_snapshot(&self) -> Result<Option<Snapshot<T>>> {
        let state = self.state.lock();
        match state.terminal {
            Terminal::Running => Ok(Some(state.observers.snapshot())),
            Terminal::Completed(_) => Ok(None),
            Terminal::Disposed => Err(self.disposed_error()),
        }
    }
}

fn broadcast<T: Clone>(observers: Snapshot<T>, value: T) {
    let mut iter = observers.into_iter().peekable();
    while let Some(observer) = iter.next() {
        if iter.peek().is_some() {
            observer.on_next(value.clone());
        } else {
            observer.on_next(value);
            break;
        }
    }
}

/// Subscription handle for one registered observer.
///
/// Holds the subject weakly so a forgotten handle does not keep it alive.
struct ObserverNode<T> {
    subject: Mutex<Option<Weak<SubjectCore<T>>>>,
    key: NodeKey,
}

impl<T> Disposable for ObserverNode<T> {
    fn dispose(&self) {
        let subject = self.subject.lock().take();
        if let Some(core) = subject.and_then(|weak| weak.upgrade()) {
            core.remove(self.key);
        }
    }

    fn is_disposed(&self) -> bool {
        self.subject.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Arc<Observer<i32>>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let observer = Observer::from_fn(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (observer, count)
    }

    #[test]
    fn test_node_dispose_is_idempotent() {
        let core = SubjectCore::<i32>::new("test");
        let (a, _) = counting();
        let (b, b_count) = counting();
        let node_a = core.subscribe(&a, None).unwrap();
        let _node_b = core.subscribe(&b, None).unwrap();

        node_a.dispose();
        node_a.dispose();
        assert!(node_a.is_disposed());
        assert_eq!(core.observer_count(), 1);

        core.next(1).unwrap();
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_node_outliving_subject() {
        let core = SubjectCore::<i32>::new("test");
        let (a, _) = counting();
        let node = core.subscribe(&a, None).unwrap();
        drop(core);
        node.dispose();
        assert!(node.is_disposed());
    }

    #[test]
    fn test_dispose_without_notify_drops_observers() {
        let core = SubjectCore::<i32>::new("test");
        let (a, _) = counting();
        core.subscribe(&a, None).unwrap();
        assert!(core.dispose(false));
        assert!(!core.dispose(true));
        assert!(!a.has_completed());
        assert!(core.next(1).unwrap_err().is_disposed());
    }

    #[test]
    fn test_dispose_with_notify_completes_observers() {
        let core = SubjectCore::<i32>::new("test");
        let (a, _) = counting();
        core.subscribe(&a, None).unwrap();
        core.dispose(true);
        assert!(a.has_completed());
        assert!(a.is_disposed());
    }

    #[test]
    fn test_observer_added_during_delivery_waits_for_next_push() {
        let core = SubjectCore::<i32>::new("test");
        let (late, late_count) = counting();
        let registered = Arc::new(AtomicUsize::new(0));

        let inner_core = Arc::clone(&core);
        let flag = registered.clone();
        let adder = Observer::from_fn(move |_| {
            if flag.fetch_add(1, Ordering::SeqCst) == 0 {
                inner_core.subscribe(&late, None).unwrap();
            }
        });
        core.subscribe(&adder, None).unwrap();

        core.next(1).unwrap();
        assert_eq!(late_count.load(Ordering::SeqCst), 0);
        core.next(2).unwrap();
        assert_eq!(late_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_observer_is_dropped_outside_the_lock() {
        use crate::disposable::{DisposeBag, Subscription};
        use std::sync::mpsc;
        use std::time::Duration;

        let core = SubjectCore::<i32>::new("test");
        let (b, _) = counting();
        let node_b = core.subscribe(&b, None).unwrap();

        // `a` owns a bag whose drop unsubscribes `b` from the same subject
        let bag = DisposeBag::new();
        bag.add(Subscription::new(node_b.clone()));
        let a = Observer::from_fn(move |_: i32| {
            let _ = bag.len();
        });
        let node_a = core.subscribe(&a, None).unwrap();
        drop(a);

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            node_a.dispose();
            let _ = tx.send(());
        });
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok(), "remove deadlocked");
        assert!(node_b.is_disposed());
        assert_eq!(core.observer_count(), 0);
    }
}
