//! Subjects: values pushed in, broadcast out
//!
//! A subject is both a push target and an [`Observable`](crate::Observable).
//! [`ReactiveVariable`](crate::ReactiveVariable) and
//! [`SimpleEvent`](crate::SimpleEvent) share one registry implementation.

mod list;
mod registry;

pub(crate) use registry::SubjectCore;

use crate::completion::Completion;
use crate::error::{Error, Result};
use crate::observer::{Observer, ObserverCore};
use std::sync::Arc;

/// Push side of a subject.
///
/// Every method fails with [`Error::ObjectDisposed`] once the subject was
/// disposed. After completion, pushes are ignored.
pub trait Subject<T>: Send + Sync {
    fn on_next(&self, value: T) -> Result<()>;

    fn on_error(&self, error: Error) -> Result<()>;

    fn on_completed(&self, completion: Completion) -> Result<()>;
}

/// Adapters available on every cloneable subject
pub trait SubjectExt<T>: Subject<T> + Clone + 'static
where
    T: 'static,
{
    /// Observer that forwards everything it receives into this subject.
    ///
    /// Pushing into a disposed subject is reported to the unhandled-error sink.
    fn as_observer(&self) -> Arc<Observer<T>> {
        Observer::new(Forwarding {
            subject: self.clone(),
        })
    }
}

impl<T: 'static, S: Subject<T> + Clone + 'static> SubjectExt<T> for S {}

struct Forwarding<S> {
    subject: S,
}

impl<T, S: Subject<T>> ObserverCore<T> for Forwarding<S> {
    fn on_next_core(&self, value: T) -> Result<()> {
        self.subject.on_next(value)
    }

    fn on_error_core(&self, error: Error) -> Result<()> {
        self.subject.on_error(error)
    }

    fn on_completed_core(&self, completion: Completion) -> Result<()> {
        self.subject.on_completed(completion)
    }
}
