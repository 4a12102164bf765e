//! Error types for lazy_fsm

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the state machine
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// No state is registered under the key
    #[error("unknown state: {0}")]
    UnknownState(String),

    /// A state is already registered under the key
    #[error("state already registered: {0}")]
    DuplicateState(String),

    /// The key holds a custom state, not a closure-backed one
    #[error("state {0} is not a SimpleState")]
    NotSimpleState(String),

    /// Publishing a toggle event failed
    #[error(transparent)]
    Rx(#[from] lazy_rx::Error),
}
