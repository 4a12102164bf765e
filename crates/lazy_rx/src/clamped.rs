//! Range-limited reactive variable

use crate::disposable::Disposable;
use crate::error::{Error, Result};
use crate::observable::Observable;
use crate::observer::Observer;
use crate::variable::ReactiveVariable;
use std::cmp::Ordering;
use std::ops::Deref;
use std::sync::Arc;

/// A [`ReactiveVariable`] whose values are clamped into `[min, max]`.
///
/// Out-of-range values, including the initial one, are silently replaced by
/// the nearest bound before the equality check.
pub struct ClampedReactiveVariable<T> {
    variable: ReactiveVariable<T>,
    min: T,
    max: T,
}

impl<T> ClampedReactiveVariable<T>
where
    T: Clone + PartialOrd + Send + Sync + 'static,
{
    /// Fails with [`Error::InvalidRange`] unless `min <= max`
    pub fn new(value: T, min: T, max: T) -> Result<Self> {
        if !matches!(min.partial_cmp(&max), Some(Ordering::Less | Ordering::Equal)) {
            return Err(Error::InvalidRange);
        }
        let (lo, hi) = (min.clone(), max.clone());
        let variable = ReactiveVariable::builder(value)
            .distinct()
            .on_value_changing(move |v: &mut T| clamp(v, &lo, &hi))
            .build();
        Ok(Self { variable, min, max })
    }

    pub fn min(&self) -> &T {
        &self.min
    }

    pub fn max(&self) -> &T {
        &self.max
    }

    /// The underlying variable handle
    pub fn variable(&self) -> &ReactiveVariable<T> {
        &self.variable
    }
}

fn clamp<T: PartialOrd + Clone>(value: &mut T, min: &T, max: &T) {
    if *value < *min {
        *value = min.clone();
    } else if *value > *max {
        *value = max.clone();
    }
}

impl<T> Deref for ClampedReactiveVariable<T> {
    type Target = ReactiveVariable<T>;

    fn deref(&self) -> &Self::Target {
        &self.variable
    }
}

impl<T> Clone for ClampedReactiveVariable<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            variable: self.variable.clone(),
            min: self.min.clone(),
            max: self.max.clone(),
        }
    }
}

impl<T> Observable<T> for ClampedReactiveVariable<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        self.variable.subscribe_core(observer)
    }
}
