//! Stream completion token

use crate::error::Error;
use std::fmt;

/// How a stream terminated.
///
/// `Success` carries nothing; `Failure` carries the error that ended the
/// stream. Exactly one of [`is_success`](Self::is_success) and
/// [`is_failure`](Self::is_failure) holds.
#[derive(Clone, Debug, Default)]
pub enum Completion {
    #[default]
    Success,
    Failure(Error),
}

impl Completion {
    /// Create a failed completion
    pub fn failure(error: Error) -> Self {
        Completion::Failure(error)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Completion::Failure(_))
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&Error> {
        match self {
            Completion::Success => None,
            Completion::Failure(error) => Some(error),
        }
    }
}

impl From<Error> for Completion {
    fn from(error: Error) -> Self {
        Completion::Failure(error)
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Success => write!(f, "Success"),
            Completion::Failure(error) => write!(f, "Failure{{{}}}", error),
        }
    }
}
