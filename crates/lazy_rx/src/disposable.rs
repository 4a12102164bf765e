//! Disposables and subscription handles

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A resource that can be released once.
///
/// Disposing twice must be a no-op.
pub trait Disposable: Send + Sync {
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

/// A disposable that does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyDisposable;

impl Disposable for EmptyDisposable {
    fn dispose(&self) {}

    fn is_disposed(&self) -> bool {
        true
    }
}

static EMPTY: OnceLock<Arc<dyn Disposable>> = OnceLock::new();

/// The shared no-op disposable
pub fn empty() -> Arc<dyn Disposable> {
    Arc::clone(EMPTY.get_or_init(|| Arc::new(EmptyDisposable)))
}

enum Slot {
    Empty,
    Assigned(Arc<dyn Disposable>),
    Disposed,
}

/// A slot that accepts exactly one disposable.
///
/// Disposing the slot disposes its content at most once. A disposable
/// assigned after the slot was disposed is disposed immediately.
pub struct SingleAssignmentDisposable {
    slot: Mutex<Slot>,
}

impl SingleAssignmentDisposable {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
        }
    }

    /// Assign the disposable; a second assignment is an error
    pub fn set(&self, disposable: Arc<dyn Disposable>) -> Result<()> {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Assigned(_)) {
            return Err(Error::AlreadyAssigned);
        }
        if matches!(*slot, Slot::Empty) {
            *slot = Slot::Assigned(disposable);
            return Ok(());
        }
        drop(slot);
        disposable.dispose();
        Ok(())
    }

    /// The current content; the empty disposable once disposed
    pub fn get(&self) -> Option<Arc<dyn Disposable>> {
        match &*self.slot.lock() {
            Slot::Empty => None,
            Slot::Assigned(disposable) => Some(Arc::clone(disposable)),
            Slot::Disposed => Some(empty()),
        }
    }
}

impl Disposable for SingleAssignmentDisposable {
    fn dispose(&self) {
        let previous = std::mem::replace(&mut *self.slot.lock(), Slot::Disposed);
        if let Slot::Assigned(disposable) = previous {
            disposable.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Disposed)
    }
}

impl Default for SingleAssignmentDisposable {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle does not unsubscribe; call [`dispose`](Self::dispose)
/// or put it into a [`DisposeBag`].
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<dyn Disposable>,
}

impl Subscription {
    pub fn new(inner: Arc<dyn Disposable>) -> Self {
        Self { inner }
    }

    /// A handle that is already disposed
    pub fn empty() -> Self {
        Self::new(empty())
    }

    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Hand the subscription to a bag and keep a copy of the handle
    pub fn add_to(self, bag: &DisposeBag) -> Self {
        bag.add(self)
    }

    pub fn into_disposable(self) -> Arc<dyn Disposable> {
        self.inner
    }

    /// Whether both handles refer to the same subscription
    pub fn same_as(&self, other: &Subscription) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(&other.inner) as *const (),
        )
    }
}

impl Disposable for Subscription {
    fn dispose(&self) {
        self.inner.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

struct BagState {
    retired: bool,
    items: Vec<Subscription>,
}

/// Collects subscriptions and disposes them together.
///
/// [`clear`](Self::clear) disposes the current items and keeps the bag usable;
/// [`dispose`](Disposable::dispose) (also run on drop) retires the bag, after
/// which added subscriptions are disposed immediately.
pub struct DisposeBag {
    state: Mutex<BagState>,
}

impl DisposeBag {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BagState {
                retired: false,
                items: Vec::new(),
            }),
        }
    }

    /// Add a subscription, returning it for chaining
    pub fn add(&self, subscription: Subscription) -> Subscription {
        let mut state = self.state.lock();
        if state.retired {
            drop(state);
            subscription.dispose();
        } else {
            state.items.push(subscription.clone());
        }
        subscription
    }

    /// Remove a subscription without disposing it
    pub fn remove(&self, subscription: &Subscription) -> bool {
        let mut state = self.state.lock();
        let before = state.items.len();
        state.items.retain(|s| !s.same_as(subscription));
        state.items.len() != before
    }

    /// Dispose every subscription and keep accepting new ones
    pub fn clear(&self) {
        let items = std::mem::take(&mut self.state.lock().items);
        for item in items {
            item.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}

impl Disposable for DisposeBag {
    fn dispose(&self) {
        let items = {
            let mut state = self.state.lock();
            state.retired = true;
            std::mem::take(&mut state.items)
        };
        for item in items {
            item.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.state.lock().retired
    }
}

impl Default for DisposeBag {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose();
    }
}
