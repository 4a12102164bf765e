use crate::completion::Completion;
use crate::disposable::{Disposable, Subscription};
use crate::error::{Error, Result};
use crate::observable::{Observable, SharedObservable};
use crate::observer::{Observer, ObserverCore};
use std::sync::Arc;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Observable returned by [`filter`](crate::ObservableExt::filter)
pub struct Where<T> {
    source: SharedObservable<T>,
    predicate: Predicate<T>,
}

impl<T: Send + 'static> Where<T> {
    pub(crate) fn new(source: SharedObservable<T>, predicate: Predicate<T>) -> Self {
        Self { source, predicate }
    }

    /// Add another predicate.
    ///
    /// Chained filters share one upstream subscription; a value passes when
    /// every predicate accepts it, evaluated in the order they were added.
    pub fn filter<P>(&self, predicate: P) -> Where<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let first = Arc::clone(&self.predicate);
        Where {
            source: Arc::clone(&self.source),
            predicate: Arc::new(move |value| first(value) && predicate(value)),
        }
    }
}

impl<T> Clone for Where<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T: Send + 'static> Observable<T> for Where<T> {
    fn subscribe_core(&self, observer: Arc<Observer<T>>) -> Result<Arc<dyn Disposable>> {
        let filtering = Observer::new(WhereObserver {
            downstream: observer,
            predicate: Arc::clone(&self.predicate),
        });
        self.source
            .subscribe(filtering)
            .map(Subscription::into_disposable)
    }
}

struct WhereObserver<T> {
    downstream: Arc<Observer<T>>,
    predicate: Predicate<T>,
}

impl<T> ObserverCore<T> for WhereObserver<T> {
    fn on_next_core(&self, value: T) -> Result<()> {
        if (self.predicate)(&value) {
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
