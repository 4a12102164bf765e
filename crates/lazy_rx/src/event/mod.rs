//! Fire-and-forget events
//!
//! [`SimpleEvent`] is a subject without a stored value. [`EventBus`] maps keys
//! to lazily created events; [`IntEvent`] and [`StringEvent`] are the integer-
//! and string-keyed buses.
//!
//! ```
//! use lazy_rx::StringEvent;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let bus = StringEvent::new();
//! let jumps = Arc::new(AtomicUsize::new(0));
//! let counter = jumps.clone();
//! bus.subscribe_unit_fn("jump", move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! })
//! .unwrap();
//!
//! bus.fire("jump").unwrap();
//! bus.fire("land").unwrap(); // nobody listens, nothing happens
//! assert_eq!(jumps.load(Ordering::SeqCst), 1);
//! ```

mod bus;
mod simple;

pub use bus::{EventBus, IntEvent, StringEvent};
pub use simple::SimpleEvent;
