use super::checked_count;
use crate::completion::Completion;
use crate::disposable::{Disposable, Subscription};
use crate::error::{Error, Result};
use crate::observable::{Observable, SharedObservable};
use crate::observer::{Observer, ObserverCore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Observable returned by [`take`](crate::ObservableExt::take) for a positive count
pub struct Take<T> {
    source: SharedObservable<T>,
    count: usize,
}

impl<T> Take<T> {
    pub(crate) fn new(source: SharedObservable<T>, count: i64) -> Result<Self> {
        Ok(Self {
            source,
            count: checked_count(count)?,
        })
    }
}

impl<T> Clone for Take<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            count: self.count,
        }
    }
}

impl<T: Send + 'static> Observable<T> for Take<T> {
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        let taking = Observer::new(TakeObserver {
            downstream: observer,
            remaining: AtomicUsize::new(self.count),
        });
        self.source
            .subscribe(taking)
            .map(Subscription::into_disposable)
    }
}

struct TakeObserver<T> {
    downstream: Arc<Observer<T>>,
    remaining: AtomicUsize,
}

impl<T> ObserverCore<T> for TakeObserver<T> {
    fn on_next_core(&self, value: T) -> Result<()> {
        let Ok(before) = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        else {
            return Ok(());
        };
        self.downstream.on_next(value);
        if before == 1 {
            // Completing downstream disposes it, which releases this observer upstream
            self.downstream.on_completed(Completion::Success);
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
