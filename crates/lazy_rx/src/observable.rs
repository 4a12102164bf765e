//! Observable sources and the subscribe entry point

use crate::completion::Completion;
use crate::disposable::{self, Disposable, Subscription};
use crate::error::{Error, Result};
use crate::observer::Observer;
use crate::operators::{Skip, Take, Where};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

/// A push-based source of values.
///
/// Implementors provide [`subscribe_core`](Self::subscribe_core); callers use
/// [`subscribe`](Self::subscribe), which links the returned upstream handle to
/// the observer so that disposing either one releases the subscription.
pub trait Observable<T>: Send + Sync {
    /// Attach `observer` and return the handle that detaches it
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>>;

    /// Subscribe an observer.
    ///
    /// If attaching fails the observer is disposed and the error is returned.
    fn subscribe(&self, observer: Arc<Observer<T>>) -> Result<Subscription>
    where
        T: 'static,
    {
        let upstream = match self.subscribe_core(Arc::clone(&observer)) {
            Ok(upstream) => upstream,
            Err(error) => {
                observer.dispose();
                return Err(error);
            }
        };
        if let Err(error) = observer.set_source_subscription(Arc::clone(&upstream)) {
            // The observer already belongs to another subscription
            upstream.dispose();
            observer.dispose();
            return Err(error);
        }
        Ok(Subscription::new(observer))
    }
}

/// Type-erased observable
pub type SharedObservable<T> = Arc<dyn Observable<T>>;

impl<T, O> Observable<T> for Arc<O>
where
    O: Observable<T> + ?Sized,
{
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        (**self).subscribe_core(observer)
    }
}

/// Completes every subscriber immediately without emitting values
pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Empty<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

type EmptyInstances = Mutex<FxHashMap<TypeId, Box<dyn Any + Send + Sync>>>;

/// One shared `Empty` per value type
static EMPTY_INSTANCES: OnceLock<EmptyInstances> = OnceLock::new();

impl<T: 'static> Empty<T> {
    /// The shared instance for `T`
    pub fn shared() -> SharedObservable<T> {
        let mut instances = EMPTY_INSTANCES.get_or_init(Default::default).lock();
        let entry = instances.entry(TypeId::of::<T>()).or_insert_with(|| {
            let empty: SharedObservable<T> = Arc::new(Empty::<T>::new());
            Box::new(empty)
        });
        entry
            .downcast_ref::<SharedObservable<T>>()
            .cloned()
            .unwrap_or_else(|| Arc::new(Empty::new()))
    }
}

impl<T> Default for Empty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Empty<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Observable<T> for Empty<T> {
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        observer.on_completed(Completion::Success);
        Ok(disposable::empty())
    }
}

/// Subscription helpers and operators available on every observable
pub trait ObservableExt<T>: Observable<T> + Sized + 'static
where
    T: Send + 'static,
{
    /// Subscribe a closure that receives each value
    fn subscribe_fn<F>(&self, on_next: F) -> Result<Subscription>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.subscribe(Observer::from_fn(on_next))
    }

    /// Subscribe closures for values, errors and completion
    fn subscribe_with<N, E, C>(&self, on_next: N, on_error: E, on_completed: C) -> Result<Subscription>
    where
        N: Fn(T) + Send + Sync + 'static,
        E: Fn(Error) + Send + Sync + 'static,
        C: Fn(Completion) + Send + Sync + 'static,
    {
        self.subscribe(Observer::from_fns(on_next, on_error, on_completed))
    }

    /// Forward only the values that satisfy `predicate`
    fn filter<P>(&self, predicate: P) -> Where<T>
    where
        Self: Clone,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Where::new(self.clone().into_shared(), Arc::new(predicate))
    }

    /// Drop the first `count` values.
    ///
    /// A negative count is rejected with [`Error::ArgumentOutOfRange`].
    fn skip(&self, count: i64) -> Result<Skip<T>>
    where
        Self: Clone,
    {
        Skip::new(self.clone().into_shared(), count)
    }

    /// Forward the first `count` values, then complete.
    ///
    /// `take(0)` is an observable that completes on subscribe. A negative
    /// count is rejected with [`Error::ArgumentOutOfRange`].
    fn take(&self, count: i64) -> Result<SharedObservable<T>>
    where
        Self: Clone,
    {
        if count == 0 {
            return Ok(Empty::shared());
        }
        Ok(Arc::new(Take::new(self.clone().into_shared(), count)?))
    }

    fn into_shared(self) -> SharedObservable<T> {
        Arc::new(self)
    }
}

impl<T, O> ObservableExt<T> for O
where
    O: Observable<T> + 'static,
    T: Send + 'static,
{
}
