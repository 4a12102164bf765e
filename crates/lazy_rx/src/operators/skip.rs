use super::checked_count;
use crate::completion::Completion;
use crate::disposable::{Disposable, Subscription};
use crate::error::{Error, Result};
use crate::observable::{Observable, SharedObservable};
use crate::observer::{Observer, ObserverCore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Observable returned by [`skip`](crate::ObservableExt::skip)
pub struct Skip<T> {
    source: SharedObservable<T>,
    count: usize,
}

impl<T> Skip<T> {
    pub(crate) fn new(source: SharedObservable<T>, count: i64) -> Result<Self> {
        Ok(Self {
            source,
            count: checked_count(count)?,
        })
    }
}

impl<T> Clone for Skip<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            count: self.count,
        }
    }
}

impl<T: Send + 'static> Observable<T> for Skip<T> {
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        // Each subscription counts on its own
        let skipping = Observer::new(SkipObserver {
            downstream: observer,
            remaining: AtomicUsize::new(self.count),
        });
        self.source
            .subscribe(skipping)
            .map(Subscription::into_disposable)
    }
}

struct SkipObserver<T> {
    downstream: Arc<Observer<T>>,
    remaining: AtomicUsize,
}

impl<T> ObserverCore<T> for SkipObserver<T> {
    fn on_next_core(&self, value: T) -> Result<()> {
        let skipped = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if !skipped {
            self.downstream.on_next(value);
        }
        Ok(())
    }

    fn on_error_core(&self, error: Error) -> Result<()> {
        self.downstream.on_error(error);
        Ok(())
    }

    fn on_completed_core(&self, completion: Completion) -> Result<()> {
        self.downstream.on_completed(completion);
        Ok(())
    }
}
