//! Lazy Finite State Machine
//!
//! Keyed states with condition, enter, update and exit hooks. Every switch is
//! published on a [`lazy_rx`] stream so other systems can react to it.
//!
//! # Example
//!
//! ```rust
//! use lazy_fsm::FiniteStateMachine;
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Clone, Debug, PartialEq, Eq, Hash)]
//! enum Light { Red, Green }
//!
//! let mut fsm = FiniteStateMachine::new();
//! fsm.define_state(Light::Red).unwrap().on_condition(|from| *from == Light::Green);
//! fsm.define_state(Light::Green).unwrap().on_condition(|from| *from == Light::Red);
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let sink = log.clone();
//! let _sub = fsm
//!     .on_state_toggled(move |from, to| sink.lock().unwrap().push(format!("{from:?} -> {to:?}")))
//!     .unwrap();
//!
//! fsm.start_state(Light::Red).unwrap();
//! fsm.toggle_state(Light::Green).unwrap();
//! assert_eq!(log.lock().unwrap().as_slice(), ["Red -> Green"]);
//! ```

pub mod error;
pub mod machine;
pub mod state;

pub use error::{Error, Result};
pub use machine::{FiniteStateMachine, StateToggle};
pub use state::{Action, Condition, SimpleState, State, UpdateAction};
