//! Error types for lazy_rx

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the reactive core.
///
/// `Error` is `Clone` so that a single failure can be broadcast to every
/// observer of a stream.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// An operation was attempted on a disposed subject
    #[error("cannot access a disposed {0}")]
    ObjectDisposed(&'static str),

    /// An operator argument was outside its valid range
    #[error("argument `{name}` is out of range: {value}")]
    ArgumentOutOfRange { name: &'static str, value: i64 },

    /// A single-assignment slot received a second disposable
    #[error("disposable is already assigned")]
    AlreadyAssigned,

    /// The process-wide observable system was initialized twice
    #[error("observable system is already initialized")]
    AlreadyInitialized,

    /// An event bus key was used with a payload type other than the one it was created with
    #[error("event `{key}` carries `{expected}`, not `{found}`")]
    PayloadMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A clamped variable was built with `min > max`
    #[error("invalid clamp range: min is greater than max")]
    InvalidRange,

    /// A user callback panicked
    #[error("callback panicked: {0}")]
    CallbackPanicked(String),

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// Free-form failure raised by user code
    #[error("{0}")]
    Message(String),

    /// Foreign error raised by user code
    #[error(transparent)]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Create a free-form error
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    /// Wrap any error type
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(Arc::new(error))
    }

    /// Whether this error reports use of a disposed subject
    pub fn is_disposed(&self) -> bool {
        matches!(self, Error::ObjectDisposed(_))
    }
}

/// Run a user callback, turning a panic into [`Error::CallbackPanicked`].
pub(crate) fn catch_callback<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Error::CallbackPanicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
