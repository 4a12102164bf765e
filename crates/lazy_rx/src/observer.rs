//! Observer lifecycle
//!
//! An [`Observer`] is the push target of a subscription. It wraps an
//! [`ObserverCore`] with the lifecycle guards every subscription needs:
//!
//! - `on_next`/`on_error` are dropped once the observer completed or was disposed
//! - `on_completed` runs at most once, even with concurrent callers
//! - `dispose` is idempotent and releases the upstream subscription
//!
//! Failures never travel back to the producer. An error returned (or a panic
//! raised) by `on_next_core` is redirected into the same observer's
//! `on_error`; failures inside `on_error_core` or `on_completed_core` go to
//! the unhandled-error sink of the current [`ObservableSystem`](crate::ObservableSystem).

use crate::completion::Completion;
use crate::disposable::{Disposable, SingleAssignmentDisposable};
use crate::error::{catch_callback, Error, Result};
use crate::system::report_unhandled;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The callbacks behind an [`Observer`].
///
/// Methods take `&self` so that delivery can re-enter the same observer;
/// implementations keep mutable state in atomics or locks.
pub trait ObserverCore<T>: Send + Sync {
    fn on_next_core(&self, value: T) -> Result<()>;

    fn on_error_core(&self, error: Error) -> Result<()>;

    fn on_completed_core(&self, completion: Completion) -> Result<()>;

    /// Extra cleanup run once when the observer is disposed
    fn dispose_core(&self) {}

    /// Whether the observer disposes itself after `on_completed`
    fn auto_dispose_on_completed(&self) -> bool {
        true
    }
}

/// Consumer side of a subscription
pub struct Observer<T> {
    core: Box<dyn ObserverCore<T>>,
    source_subscription: SingleAssignmentDisposable,
    called_on_completed: AtomicBool,
    disposed: AtomicBool,
}

impl<T: 'static> Observer<T> {
    /// Wrap a custom core
    pub fn new<C>(core: C) -> Arc<Self>
    where
        C: ObserverCore<T> + 'static,
    {
        Arc::new(Self {
            core: Box::new(core),
            source_subscription: SingleAssignmentDisposable::new(),
            called_on_completed: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        })
    }

    /// Observer that forwards values to `on_next`.
    ///
    /// Errors go to the unhandled-error sink; a failed completion is reported
    /// there as well.
    pub fn from_fn<F>(on_next: F) -> Arc<Self>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self::new(AnonymousObserver::new(
            move |value| {
                on_next(value);
                Ok(())
            },
            report_error,
            report_failure,
        ))
    }

    /// Like [`from_fn`](Self::from_fn), but `on_next` may fail; its error is
    /// routed to the unhandled-error sink through `on_error`.
    pub fn from_fallible<F>(on_next: F) -> Arc<Self>
    where
        F: Fn(T) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(AnonymousObserver::new(on_next, report_error, report_failure))
    }

    /// Observer with explicit callbacks for every notification
    pub fn from_fns<N, E, C>(on_next: N, on_error: E, on_completed: C) -> Arc<Self>
    where
        N: Fn(T) + Send + Sync + 'static,
        E: Fn(Error) + Send + Sync + 'static,
        C: Fn(Completion) + Send + Sync + 'static,
    {
        Self::new(AnonymousObserver::new(
            move |value| {
                on_next(value);
                Ok(())
            },
            move |error| {
                on_error(error);
                Ok(())
            },
            move |completion| {
                on_completed(completion);
                Ok(())
            },
        ))
    }
}

impl<T> Observer<T> {
    pub fn on_next(&self, value: T) {
        if self.is_disposed() || self.has_completed() {
            return;
        }
        if let Err(error) = catch_callback(|| self.core.on_next_core(value)) {
            self.on_error(error);
        }
    }

    pub fn on_error(&self, error: Error) {
        if self.is_disposed() || self.has_completed() {
            return;
        }
        if let Err(escaped) = catch_callback(|| self.core.on_error_core(error)) {
            report_unhandled(&escaped);
        }
    }

    pub fn on_completed(&self, completion: Completion) {
        if self.called_on_completed.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.is_disposed() {
            return;
        }

        let mut dispose = self.core.auto_dispose_on_completed();
        if let Err(escaped) = catch_callback(|| self.core.on_completed_core(completion)) {
            dispose = true;
            report_unhandled(&escaped);
        }
        if dispose {
            self.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Whether `on_completed` has been called
    pub fn has_completed(&self) -> bool {
        self.called_on_completed.load(Ordering::Acquire)
    }

    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.core.dispose_core();
        self.source_subscription.dispose();
    }

    /// Link the upstream subscription released by `dispose`
    pub(crate) fn set_source_subscription(&self, subscription: Arc<dyn Disposable>) -> Result<()> {
        self.source_subscription.set(subscription)
    }
}

impl<T> Disposable for Observer<T> {
    fn dispose(&self) {
        Observer::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        Observer::is_disposed(self)
    }
}

impl<T> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("completed", &self.has_completed())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

fn report_error(error: Error) -> Result<()> {
    report_unhandled(&error);
    Ok(())
}

fn report_failure(completion: Completion) -> Result<()> {
    if let Completion::Failure(error) = completion {
        report_unhandled(&error);
    }
    Ok(())
}

type NextFn<T> = Box<dyn Fn(T) -> Result<()> + Send + Sync>;
type ErrorFn = Box<dyn Fn(Error) -> Result<()> + Send + Sync>;
type CompletedFn = Box<dyn Fn(Completion) -> Result<()> + Send + Sync>;

/// Closure-backed observer core
pub struct AnonymousObserver<T> {
    on_next: NextFn<T>,
    on_error: ErrorFn,
    on_completed: CompletedFn,
}

impl<T> AnonymousObserver<T> {
    pub fn new<N, E, C>(on_next: N, on_error: E, on_completed: C) -> Self
    where
        N: Fn(T) -> Result<()> + Send + Sync + 'static,
        E: Fn(Error) -> Result<()> + Send + Sync + 'static,
        C: Fn(Completion) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            on_next: Box::new(on_next),
            on_error: Box::new(on_error),
            on_completed: Box::new(on_completed),
        }
    }
}

impl<T> ObserverCore<T> for AnonymousObserver<T> {
    fn on_next_core(&self, value: T) -> Result<()> {
        (self.on_next)(value)
    }

    fn on_error_core(&self, error: Error) -> Result<()> {
        (self.on_error)(error)
    }

    fn on_completed_core(&self, completion: Completion) -> Result<()> {
        (self.on_completed)(completion)
    }
}
