//! Observable system root context
//!
//! `ObservableSystem` owns the process-wide unhandled-error sink: the handler
//! that receives failures escaping observer callbacks which cannot be reported
//! back to the code that pushed the value.
//!
//! # Initialization
//!
//! The global system is installed once at startup:
//!
//! ```
//! use lazy_rx::{ObservableSystem, RxConfig};
//!
//! let system = ObservableSystem::new(RxConfig::default())
//!     .with_handler(|error: &lazy_rx::Error| eprintln!("rx: {error}"));
//! // A second init returns `Error::AlreadyInitialized`.
//! let _ = ObservableSystem::init(system);
//! ```
//!
//! If `init()` is never called, a default system logging through `tracing`
//! is created on first use.
//!
//! # Scoped overrides
//!
//! Tests (or any code that needs isolation) can push a system for the current
//! thread only:
//!
//! ```
//! use lazy_rx::{ObservableSystem, RxConfig};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let system = ObservableSystem::new(RxConfig::default())
//!     .with_handler(move |error: &lazy_rx::Error| sink.lock().unwrap().push(error.to_string()));
//!
//! ObservableSystem::scope(system, || {
//!     lazy_rx::report_unhandled(&lazy_rx::Error::msg("oops"));
//! });
//! assert_eq!(seen.lock().unwrap().as_slice(), ["oops"]);
//! ```

use crate::config::{LogLevel, RxConfig};
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

/// Receives errors that escaped observer callbacks
pub trait UnhandledErrorHandler: Send + Sync {
    fn handle(&self, error: &Error);
}

impl<F> UnhandledErrorHandler for F
where
    F: Fn(&Error) + Send + Sync,
{
    fn handle(&self, error: &Error) {
        self(error)
    }
}

/// Default handler: logs the error and continues
#[derive(Clone, Copy, Debug, Default)]
pub struct LogErrorHandler {
    level: LogLevel,
}

impl LogErrorHandler {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl UnhandledErrorHandler for LogErrorHandler {
    fn handle(&self, error: &Error) {
        match self.level {
            LogLevel::Trace => tracing::trace!(%error, "rx unhandled error"),
            LogLevel::Debug => tracing::debug!(%error, "rx unhandled error"),
            LogLevel::Info => tracing::info!(%error, "rx unhandled error"),
            LogLevel::Warn => tracing::warn!(%error, "rx unhandled error"),
            LogLevel::Error => tracing::error!(%error, "rx unhandled error"),
        }
    }
}

/// Global system instance
static GLOBAL_SYSTEM: OnceLock<Arc<ObservableSystem>> = OnceLock::new();

// Thread-local stack for scoped systems
thread_local! {
    static SYSTEM_STACK: RefCell<Vec<Arc<ObservableSystem>>> = RefCell::new(Vec::new());
}

/// Root context for the reactive core
pub struct ObservableSystem {
    config: RxConfig,
    handler: Arc<dyn UnhandledErrorHandler>,
}

impl ObservableSystem {
    /// Create a system whose handler logs at the configured level
    pub fn new(config: RxConfig) -> Self {
        let handler = Arc::new(LogErrorHandler::new(config.unhandled.level));
        Self { config, handler }
    }

    /// Replace the unhandled-error handler
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: UnhandledErrorHandler + 'static,
    {
        self.handler = Arc::new(handler);
        self
    }

    /// Install the global system (call once at startup)
    pub fn init(system: ObservableSystem) -> Result<()> {
        GLOBAL_SYSTEM
            .set(Arc::new(system))
            .map_err(|_| Error::AlreadyInitialized)?;
        tracing::debug!("observable system initialized");
        Ok(())
    }

    /// Whether the global system has been installed or lazily created
    pub fn is_initialized() -> bool {
        GLOBAL_SYSTEM.get().is_some()
    }

    /// The global system, created with defaults if `init()` was never called
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL_SYSTEM.get_or_init(|| Arc::new(Self::default())))
    }

    /// The innermost scoped system on this thread, or the global one
    pub fn current() -> Arc<Self> {
        SYSTEM_STACK
            .with(|stack| stack.borrow().last().cloned())
            .unwrap_or_else(Self::global)
    }

    /// Run `f` with `system` as the current system on this thread
    pub fn scope<F, R>(system: ObservableSystem, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        SYSTEM_STACK.with(|stack| stack.borrow_mut().push(Arc::new(system)));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        SYSTEM_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    pub fn config(&self) -> &RxConfig {
        &self.config
    }

    /// Send an error to this system's handler
    pub fn report(&self, error: &Error) {
        self.handler.handle(error);
    }
}

impl Default for ObservableSystem {
    fn default() -> Self {
        Self::new(RxConfig::default())
    }
}

/// Report an error to the current system's unhandled-error handler
pub fn report_unhandled(error: &Error) {
    ObservableSystem::current().report(error);
}
