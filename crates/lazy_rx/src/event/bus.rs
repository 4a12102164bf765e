use super::simple::SimpleEvent;
use crate::disposable::Subscription;
use crate::error::{Error, Result};
use crate::observable::Observable;
use crate::observer::Observer;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::any::{type_name, Any};
use std::borrow::Borrow;
use std::fmt::{self, Display};
use std::hash::Hash;
use std::sync::Arc;

/// A channel with its payload type erased
trait ErasedChannel: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn payload_name(&self) -> &'static str;

    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    fn observer_count(&self) -> usize;
}

impl<T> ErasedChannel for SimpleEvent<T>
where
    T: Clone + Send + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn payload_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn dispose(&self) {
        SimpleEvent::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        SimpleEvent::is_disposed(self)
    }

    fn observer_count(&self) -> usize {
        SimpleEvent::observer_count(self)
    }
}

fn downcast<T, Q>(channel: &dyn ErasedChannel, key: &Q) -> Result<SimpleEvent<T>>
where
    T: Clone + Send + 'static,
    Q: Display + ?Sized,
{
    channel
        .as_any()
        .downcast_ref::<SimpleEvent<T>>()
        .cloned()
        .ok_or_else(|| Error::PayloadMismatch {
            key: key.to_string(),
            expected: channel.payload_name(),
            found: type_name::<T>(),
        })
}

/// Keyed registry of [`SimpleEvent`] channels.
///
/// A channel is created by the first subscribe for its key; its payload type is
/// fixed from then on and any access with another type fails with
/// [`Error::PayloadMismatch`]. Payload-less events use `()`.
pub struct EventBus<K> {
    channels: Mutex<FxHashMap<K, Arc<dyn ErasedChannel>>>,
}

/// Event bus keyed by integers
pub type IntEvent = EventBus<i32>;

/// Event bus keyed by strings
pub type StringEvent = EventBus<String>;

impl<K> EventBus<K>
where
    K: Eq + Hash + Display,
{
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(FxHashMap::default()),
        }
    }

    /// Subscribe to `key`, creating its channel on first use.
    ///
    /// On failure the observer is disposed.
    pub fn subscribe<T>(&self, key: impl Into<K>, observer: Arc<Observer<T>>) -> Result<Subscription>
    where
        T: Clone + Send + 'static,
    {
        match self.event::<T>(key) {
            Ok(event) => event.subscribe(observer),
            Err(error) => {
                observer.dispose();
                Err(error)
            }
        }
    }

    /// Subscribe to a payload-less event
    pub fn subscribe_unit(&self, key: impl Into<K>, observer: Arc<Observer<()>>) -> Result<Subscription> {
        self.subscribe(key, observer)
    }

    /// Subscribe a closure to a payload-carrying event
    pub fn subscribe_fn<T, F>(&self, key: impl Into<K>, on_next: F) -> Result<Subscription>
    where
        T: Clone + Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.subscribe(key, Observer::from_fn(on_next))
    }

    /// Subscribe a closure to a payload-less event
    pub fn subscribe_unit_fn<F>(&self, key: impl Into<K>, on_event: F) -> Result<Subscription>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_unit(key, Observer::from_fn(move |()| on_event()))
    }

    /// The channel behind `key`, created if missing.
    ///
    /// Useful for applying operators to one key of the bus. A channel disposed
    /// through its handle is replaced by a fresh one.
    pub fn event<T>(&self, key: impl Into<K>) -> Result<SimpleEvent<T>>
    where
        T: Clone + Send + 'static,
    {
        let key = key.into();
        let mut channels = self.channels.lock();
        if let Some(channel) = channels.get(&key).filter(|c| !c.is_disposed()) {
            return downcast(channel.as_ref(), &key);
        }
        let event = SimpleEvent::<T>::new();
        channels.insert(key, Arc::new(event.clone()));
        Ok(event)
    }

    /// Push `value` on `key`; a key without a live channel is ignored
    pub fn emit<T, Q>(&self, key: &Q, value: T) -> Result<()>
    where
        T: Clone + Send + 'static,
        K: Borrow<Q>,
        Q: Hash + Eq + Display + ?Sized,
    {
        let event = {
            let channels = self.channels.lock();
            match channels.get(key).filter(|c| !c.is_disposed()) {
                Some(channel) => downcast::<T, Q>(channel.as_ref(), key)?,
                None => return Ok(()),
            }
        };
        match event.fire(value) {
            // Disposed through its handle after the lookup
            Err(error) if error.is_disposed() => Ok(()),
            result => result,
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.channels.lock().contains_key(key)
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }

    /// Remove every channel and complete its observers.
    ///
    /// The bus stays usable; later subscriptions create fresh channels.
    pub fn dispose(&self) {
        let drained: Vec<_> = self.channels.lock().drain().map(|(_, c)| c).collect();
        let observers: usize = drained.iter().map(|c| c.observer_count()).sum();
        for channel in &drained {
            channel.dispose();
        }
        tracing::debug!(channels = drained.len(), observers, "event bus flushed");
    }
}

impl EventBus<i32> {
    /// Fire the payload-less event `key`
    pub fn trigger(&self, key: i32) -> Result<()> {
        self.emit(&key, ())
    }

    /// Fire `key` with `data`
    pub fn trigger_with<T>(&self, key: i32, data: T) -> Result<()>
    where
        T: Clone + Send + 'static,
    {
        self.emit(&key, data)
    }
}

impl EventBus<String> {
    /// Fire the payload-less event `key`
    pub fn fire(&self, key: &str) -> Result<()> {
        self.emit(key, ())
    }

    /// Fire `key` with `data`
    pub fn fire_with<T>(&self, key: &str, data: T) -> Result<()>
    where
        T: Clone + Send + 'static,
    {
        self.emit(key, data)
    }
}

impl<K> Default for EventBus<K>
where
    K: Eq + Hash + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for EventBus<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.lock().len())
            .finish()
    }
}
