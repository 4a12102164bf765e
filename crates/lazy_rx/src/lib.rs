//! Lazy Reactive Core
//!
//! Push-based streams for game and application state:
//!
//! - **Observers**: lifecycle-guarded consumers with error containment
//! - **Reactive Variables**: value cells that broadcast changes
//! - **Operators**: `filter`, `skip` and `take`
//! - **Events**: value-less signals and keyed event buses
//!
//! Delivery is synchronous on the caller's thread, in subscription order. A
//! push reaches only the observers registered when it started.
//!
//! # Example
//!
//! ```rust
//! use lazy_rx::{DisposeBag, ObservableExt, ReactiveVariable};
//! use std::sync::{Arc, Mutex};
//!
//! let score = ReactiveVariable::with_init(0, true);
//! let milestones = Arc::new(Mutex::new(Vec::new()));
//! let sink = milestones.clone();
//!
//! let bag = DisposeBag::new();
//! score
//!     .filter(|s| s % 100 == 0)
//!     .skip(1)
//!     .unwrap()
//!     .subscribe_fn(move |s| sink.lock().unwrap().push(s))
//!     .unwrap()
//!     .add_to(&bag);
//!
//! for s in [50, 100, 150, 200] {
//!     score.set(s).unwrap();
//! }
//! drop(bag);
//! score.set(300).unwrap();
//!
//! assert_eq!(milestones.lock().unwrap().as_slice(), [100, 200]);
//! ```

pub mod clamped;
pub mod completion;
pub mod config;
pub mod disposable;
pub mod error;
pub mod event;
pub mod observable;
pub mod observer;
pub mod operators;
pub mod subject;
pub mod system;
pub mod variable;

pub use clamped::ClampedReactiveVariable;
pub use completion::Completion;
pub use config::{LogLevel, RxConfig};
pub use disposable::{Disposable, DisposeBag, SingleAssignmentDisposable, Subscription};
pub use error::{Error, Result};
pub use event::{EventBus, IntEvent, SimpleEvent, StringEvent};
pub use observable::{Empty, Observable, ObservableExt, SharedObservable};
pub use observer::{AnonymousObserver, Observer, ObserverCore};
pub use operators::{Skip, Take, Where};
pub use subject::{Subject, SubjectExt};
pub use system::{report_unhandled, LogErrorHandler, ObservableSystem, UnhandledErrorHandler};
pub use variable::{ReactiveVariable, ReactiveVariableBuilder, ReadOnlyReactiveVariable};
