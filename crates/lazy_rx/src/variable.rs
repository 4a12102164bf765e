//! Reactive variables
//!
//! A [`ReactiveVariable`] holds a current value and pushes every change to its
//! subscribers, in subscription order, on the thread that called `set`.
//!
//! ```
//! use lazy_rx::{ObservableExt, ReactiveVariable};
//! use std::sync::{Arc, Mutex};
//!
//! let health = ReactiveVariable::new(100);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//!
//! // Subscribers see the current value first
//! let sub = health.subscribe_fn(move |v| sink.lock().unwrap().push(v)).unwrap();
//! health.set(90).unwrap();
//! health.set(90).unwrap(); // equal values are not pushed
//! sub.dispose();
//! health.set(80).unwrap();
//!
//! assert_eq!(seen.lock().unwrap().as_slice(), [100, 90]);
//! assert_eq!(health.value(), 80);
//! ```

use crate::completion::Completion;
use crate::disposable::Disposable;
use crate::error::{Error, Result};
use crate::observable::Observable;
use crate::observer::Observer;
use crate::subject::{Subject, SubjectCore};
use crate::system::ObservableSystem;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

const KIND: &str = "ReactiveVariable";

type EqualityFn<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;
type ChangingFn<T> = Box<dyn Fn(&mut T) + Send + Sync>;
type ChangedFn<T> = Box<dyn Fn(&T) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&Error) + Send + Sync>;

struct Inner<T> {
    value: Mutex<T>,
    core: Arc<SubjectCore<T>>,
    equality: Option<EqualityFn<T>>,
    subscribe_with_init: bool,
    on_changing: Option<ChangingFn<T>>,
    on_changed: Option<ChangedFn<T>>,
    on_error: Option<ErrorFn>,
}

/// A value cell that broadcasts changes.
///
/// Cloning the handle shares the same cell.
pub struct ReactiveVariable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ReactiveVariable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ReactiveVariable<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Create a variable that skips pushes of equal values.
    ///
    /// Replay on subscribe follows `[variables] subscribe_with_init` of the
    /// current [`ObservableSystem`].
    pub fn new(value: T) -> Self {
        Self::builder(value).distinct().build()
    }

    /// Like [`new`](Self::new) with an explicit replay flag
    pub fn with_init(value: T, subscribe_with_init: bool) -> Self {
        Self::builder(value)
            .distinct()
            .subscribe_with_init(subscribe_with_init)
            .build()
    }
}

impl<T> ReactiveVariable<T>
where
    T: Clone + Send + 'static,
{
    /// Start configuring a variable; without an equality function every
    /// `set` is pushed
    pub fn builder(value: T) -> ReactiveVariableBuilder<T> {
        ReactiveVariableBuilder::new(value)
    }

    /// Clone of the current value
    pub fn value(&self) -> T {
        self.inner.value.lock().clone()
    }

    /// Borrow the current value.
    ///
    /// The cell stays locked while `f` runs; `f` must not write to this variable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.lock())
    }

    /// Store a new value and push it when it differs from the current one.
    ///
    /// Fails with [`Error::ObjectDisposed`] after `dispose`. After completion
    /// the call is ignored and the value stays unchanged.
    pub fn set(&self, value: T) -> Result<()> {
        self.store(value, true)
    }

    /// Compute the next value from the current one, then [`set`](Self::set) it
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<()> {
        let next = self.with(f);
        self.set(next)
    }

    /// Push the current value again, regardless of equality
    pub fn force_notify(&self) -> Result<()> {
        self.store(self.value(), false)
    }

    pub fn has_observers(&self) -> bool {
        self.inner.core.has_observers()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.core.observer_count()
    }

    pub fn is_completed(&self) -> bool {
        self.inner.core.is_completed()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }

    pub fn is_completed_or_disposed(&self) -> bool {
        self.is_completed() || self.is_disposed()
    }

    /// Whether new subscribers receive the current value first
    pub fn replays_on_subscribe(&self) -> bool {
        self.inner.subscribe_with_init
    }

    /// Read-only view of this variable
    pub fn read_only(&self) -> ReadOnlyReactiveVariable<T> {
        ReadOnlyReactiveVariable {
            source: self.clone(),
        }
    }

    /// Dispose, completing current subscribers first
    pub fn dispose(&self) {
        self.dispose_with(true);
    }

    /// Dispose; with `call_on_completed`, subscribers of a running variable
    /// receive a successful completion
    pub fn dispose_with(&self, call_on_completed: bool) {
        if self.inner.core.dispose(call_on_completed) {
            tracing::debug!(call_on_completed, "reactive variable disposed");
        }
    }

    fn store(&self, mut value: T, check_equality: bool) -> Result<()> {
        let inner = &self.inner;
        inner.core.ensure_not_disposed()?;
        if inner.core.is_completed() {
            return Ok(());
        }
        if let Some(hook) = &inner.on_changing {
            hook(&mut value);
        }
        {
            let mut current = inner.value.lock();
            if check_equality {
                if let Some(equal) = &inner.equality {
                    if equal(&*current, &value) {
                        return Ok(());
                    }
                }
            }
            *current = value.clone();
        }
        if let Some(hook) = &inner.on_changed {
            hook(&value);
        }
        inner.core.next(value)
    }
}

impl<T> Subject<T> for ReactiveVariable<T>
where
    T: Clone + Send + 'static,
{
    /// Store and push without the equality check
    fn on_next(&self, value: T) -> Result<()> {
        self.store(value, false)
    }

    /// Push an error to every subscriber; the variable keeps running
    fn on_error(&self, error: Error) -> Result<()> {
        self.inner.core.ensure_not_disposed()?;
        if self.inner.core.is_completed() {
            return Ok(());
        }
        if let Some(hook) = &self.inner.on_error {
            hook(&error);
        }
        self.inner.core.error(error).map(|_| ())
    }

    fn on_completed(&self, completion: Completion) -> Result<()> {
        self.inner.core.ensure_not_disposed()?;
        if self.inner.core.is_completed() {
            return Ok(());
        }
        if let (Some(hook), Some(error)) = (&self.inner.on_error, completion.error()) {
            hook(error);
        }
        self.inner.core.complete(completion).map(|_| ())
    }
}

impl<T> Observable<T> for ReactiveVariable<T>
where
    T: Clone + Send + 'static,
{
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        if !self.inner.subscribe_with_init {
            return self.inner.core.subscribe(&observer, None);
        }
        let current: &dyn Fn() -> T = &|| self.value();
        self.inner.core.subscribe(&observer, Some(current))
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveVariable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveVariable")
            .field("value", &*self.inner.value.lock())
            .field("observers", &self.inner.core.observer_count())
            .finish()
    }
}

impl<T> Default for ReactiveVariable<T>
where
    T: Clone + PartialEq + Default + Send + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Configures a [`ReactiveVariable`]
pub struct ReactiveVariableBuilder<T> {
    value: T,
    equality: Option<EqualityFn<T>>,
    subscribe_with_init: Option<bool>,
    on_changing: Option<ChangingFn<T>>,
    on_changed: Option<ChangedFn<T>>,
    on_error: Option<ErrorFn>,
}

impl<T> ReactiveVariableBuilder<T>
where
    T: Clone + Send + 'static,
{
    fn new(value: T) -> Self {
        Self {
            value,
            equality: None,
            subscribe_with_init: None,
            on_changing: None,
            on_changed: None,
            on_error: None,
        }
    }

    /// Skip pushes when `equal(current, new)` holds
    pub fn compare_with<F>(mut self, equal: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.equality = Some(Box::new(equal));
        self
    }

    /// Push on every `set`, even for equal values
    pub fn always_notify(mut self) -> Self {
        self.equality = None;
        self
    }

    /// Replay the current value to new subscribers (overrides the config default)
    pub fn subscribe_with_init(mut self, enabled: bool) -> Self {
        self.subscribe_with_init = Some(enabled);
        self
    }

    /// Rewrite incoming values before they are compared and stored.
    ///
    /// Also runs on the initial value.
    pub fn on_value_changing<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.on_changing = Some(Box::new(hook));
        self
    }

    /// Observe every stored value before it is pushed.
    ///
    /// Also runs on the initial value.
    pub fn on_value_changed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_changed = Some(Box::new(hook));
        self
    }

    /// Observe errors and failed completions pushed into the variable
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> ReactiveVariable<T> {
        let mut value = self.value;
        if let Some(hook) = &self.on_changing {
            hook(&mut value);
        }
        if let Some(hook) = &self.on_changed {
            hook(&value);
        }
        let subscribe_with_init = self.subscribe_with_init.unwrap_or_else(|| {
            ObservableSystem::current()
                .config()
                .variables
                .subscribe_with_init
        });
        ReactiveVariable {
            inner: Arc::new(Inner {
                value: Mutex::new(value),
                core: SubjectCore::new(KIND),
                equality: self.equality,
                subscribe_with_init,
                on_changing: self.on_changing,
                on_changed: self.on_changed,
                on_error: self.on_error,
            }),
        }
    }
}

impl<T> ReactiveVariableBuilder<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Skip pushes of values equal to the current one
    pub fn distinct(self) -> Self {
        self.compare_with(|a: &T, b: &T| a == b)
    }
}

/// Read-only view of a [`ReactiveVariable`]
pub struct ReadOnlyReactiveVariable<T> {
    source: ReactiveVariable<T>,
}

impl<T> Clone for ReadOnlyReactiveVariable<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T> ReadOnlyReactiveVariable<T>
where
    T: Clone + Send + 'static,
{
    pub fn value(&self) -> T {
        self.source.value()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.source.with(f)
    }

    pub fn is_completed(&self) -> bool {
        self.source.is_completed()
    }

    pub fn is_disposed(&self) -> bool {
        self.source.is_disposed()
    }
}

impl<T> Observable<T> for ReadOnlyReactiveVariable<T>
where
    T: Clone + Send + 'static,
{
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        self.source.subscribe_core(observer)
    }
}

impl<T> From<ReactiveVariable<T>> for ReadOnlyReactiveVariable<T> {
    fn from(source: ReactiveVariable<T>) -> Self {
        Self { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::ObservableExt;
    use crate::subject::SubjectExt;
    use std::sync::Mutex as StdMutex;

    fn record<O: ObservableExt<i32>>(source: &O) -> (crate::Subscription, Arc<StdMutex<Vec<i32>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = source
            .subscribe_fn(move |v| sink.lock().unwrap().push(v))
            .unwrap();
        (sub, seen)
    }

    #[test]
    fn test_replay_then_changes() {
        let var = ReactiveVariable::with_init(1, true);
        let (_sub, seen) = record(&var);
        var.set(2).unwrap();
        var.set(2).unwrap();
        var.set(3).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), [1, 2, 3]);
    }

    #[test]
    fn test_without_replay() {
        let var = ReactiveVariable::with_init(1, false);
        let (_sub, seen) = record(&var);
        var.set(2).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), [2]);
    }

    #[test]
    fn test_always_notify_pushes_equal_values() {
        let var = ReactiveVariable::builder(5).always_notify().subscribe_with_init(false).build();
        let (_sub, seen) = record(&var);
        var.set(5).unwrap();
        var.set(5).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), [5, 5]);
    }

    #[test]
    fn test_force_notify_ignores_equality() {
        let var = ReactiveVariable::with_init(7, false);
        let (_sub, seen) = record(&var);
        var.force_notify().unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), [7]);
    }

    #[test]
    fn test_hooks_run_on_initial_value_and_changes() {
        let changed = Arc::new(StdMutex::new(Vec::new()));
        let log = changed.clone();
        let var = ReactiveVariable::builder(3)
            .distinct()
            .on_value_changing(|v: &mut i32| *v *= 10)
            .on_value_changed(move |v: &i32| log.lock().unwrap().push(*v))
            .build();
        assert_eq!(var.value(), 30);
        var.set(4).unwrap();
        assert_eq!(var.value(), 40);
        assert_eq!(changed.lock().unwrap().as_slice(), [30, 40]);
    }

    #[test]
    fn test_update_uses_current_value() {
        let var = ReactiveVariable::new(1);
        var.update(|v| v + 41).unwrap();
        assert_eq!(var.value(), 42);
    }

    #[test]
    fn test_set_after_completion_is_ignored() {
        let var = ReactiveVariable::new(1);
        var.on_completed(Completion::Success).unwrap();
        var.set(2).unwrap();
        assert_eq!(var.value(), 1);
        assert!(var.is_completed());
    }

    #[test]
    fn test_use_after_dispose_fails() {
        let var = ReactiveVariable::new(1);
        var.dispose();
        assert!(var.set(2).unwrap_err().is_disposed());
        assert!(var.force_notify().unwrap_err().is_disposed());
        assert!(var.on_error(Error::msg("x")).unwrap_err().is_disposed());
        assert!(var
            .on_completed(Completion::Success)
            .unwrap_err()
            .is_disposed());
        assert!(var.on_next(3).unwrap_err().is_disposed());
        let observer = Observer::from_fn(|_: i32| {});
        assert!(var.subscribe(observer.clone()).unwrap_err().is_disposed());
        assert!(observer.is_disposed());
    }

    #[test]
    fn test_on_error_keeps_variable_running() {
        let hook_seen = Arc::new(StdMutex::new(Vec::new()));
        let hook_log = hook_seen.clone();
        let var = ReactiveVariable::builder(0)
            .on_error(move |e: &Error| hook_log.lock().unwrap().push(e.to_string()))
            .build();
        let errors = Arc::new(StdMutex::new(Vec::new()));
        let sink = errors.clone();
        let _sub = var
            .subscribe_with(|_| {}, move |e| sink.lock().unwrap().push(e.to_string()), |_| {})
            .unwrap();

        var.on_error(Error::msg("glitch")).unwrap();
        assert!(!var.is_completed());
        assert_eq!(errors.lock().unwrap().as_slice(), ["glitch"]);
        assert_eq!(hook_seen.lock().unwrap().as_slice(), ["glitch"]);
    }

    #[test]
    fn test_late_subscriber_sees_value_and_completion() {
        let var = ReactiveVariable::with_init(9, true);
        var.on_completed(Completion::Success).unwrap();

        let events = Arc::new(StdMutex::new(Vec::new()));
        let (n, c) = (events.clone(), events.clone());
        let sub = var
            .subscribe_with(
                move |v| n.lock().unwrap().push(format!("next {v}")),
                |_| {},
                move |done: Completion| c.lock().unwrap().push(format!("done {done}")),
            )
            .unwrap();
        assert_eq!(events.lock().unwrap().as_slice(), ["next 9", "done Success"]);
        assert!(sub.is_disposed());
    }

    #[test]
    fn test_late_subscriber_to_failed_variable_gets_failure_only() {
        let var = ReactiveVariable::with_init(9, true);
        var.on_completed(Completion::failure(Error::msg("gone"))).unwrap();
        let events = Arc::new(StdMutex::new(Vec::new()));
        let (n, c) = (events.clone(), events.clone());
        var.subscribe_with(
            move |v| n.lock().unwrap().push(format!("next {v}")),
            |_| {},
            move |done: Completion| c.lock().unwrap().push(format!("done {done}")),
        )
        .unwrap();
        assert_eq!(events.lock().unwrap().as_slice(), ["done Failure{gone}"]);
    }

    #[test]
    fn test_as_observer_pipes_between_variables() {
        let source = ReactiveVariable::with_init(1, true);
        let target = ReactiveVariable::with_init(0, false);
        let (_t, seen) = record(&target);
        let _pipe = source.subscribe(target.as_observer()).unwrap();
        source.set(2).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), [1, 2]);
        assert_eq!(target.value(), 2);
    }

    #[test]
    fn test_read_only_view_tracks_source() {
        let var = ReactiveVariable::with_init(1, true);
        let view = var.read_only();
        let (_sub, seen) = record(&view);
        var.set(2).unwrap();
        assert_eq!(view.value(), 2);
        assert_eq!(seen.lock().unwrap().as_slice(), [1, 2]);
    }
}
