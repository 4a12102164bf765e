//! Stream operators
//!
//! - [`Where`]: forward values matching a predicate
//! - [`Skip`]: drop the first N values
//! - [`Take`]: forward the first N values, then complete
//!
//! Each subscription to an operator creates its own intermediate observer, so
//! counters are never shared between subscribers.

mod filter;
mod skip;
mod take;

pub use filter::Where;
pub use skip::Skip;
pub use take::Take;

use crate::error::{Error, Result};

fn checked_count(count: i64) -> Result<usize> {
    usize::try_from(count).map_err(|_| Error::ArgumentOutOfRange {
        name: "count",
        value: count,
    })
}

#[cfg(test)]
mod tests {
    use crate::completion::Completion;
    use crate::error::Error;
    use crate::event::SimpleEvent;
    use crate::observable::{Observable, ObservableExt};
    use crate::observer::Observer;
    use crate::subject::Subject;
    use std::sync::{Arc, Mutex};

    fn collect<O: Observable<i32> + ?Sized>(
        source: &O,
    ) -> (crate::Subscription, Arc<Mutex<Vec<i32>>>, Arc<Mutex<usize>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(0));
        let (s, c) = (seen.clone(), completions.clone());
        let sub = source
            .subscribe(Observer::from_fns(
                move |v| s.lock().unwrap().push(v),
                |_| {},
                move |_| *c.lock().unwrap() += 1,
            ))
            .unwrap();
        (sub, seen, completions)
    }

    #[test]
    fn test_filter_forwards_matching_values() {
        let event = SimpleEvent::<i32>::new();
        let (_sub, seen, _) = collect(&event.filter(|v| v % 2 == 0));
        for v in 1..=6 {
            event.fire(v).unwrap();
        }
        assert_eq!(seen.lock().unwrap().as_slice(), [2, 4, 6]);
    }

    #[test]
    fn test_chained_filters_apply_all_predicates() {
        let event = SimpleEvent::<i32>::new();
        let evens_over_two = event.filter(|v| v % 2 == 0).filter(|v| *v > 2);
        let (_sub, seen, _) = collect(&evens_over_two);
        for v in 1..=6 {
            event.fire(v).unwrap();
        }
        assert_eq!(seen.lock().unwrap().as_slice(), [4, 6]);
        assert_eq!(event.observer_count(), 1);
    }

    #[test]
    fn test_panicking_predicate_reaches_on_error() {
        let event = SimpleEvent::<i32>::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let _sub = event
            .filter(|v| if *v == 3 { panic!("three") } else { true })
            .subscribe_with(|_| {}, move |e: Error| sink.lock().unwrap().push(e.to_string()), |_| {})
            .unwrap();
        event.fire(3).unwrap();
        assert_eq!(errors.lock().unwrap().as_slice(), ["callback panicked: three"]);
    }

    #[test]
    fn test_skip_counts_per_subscription() {
        let event = SimpleEvent::<i32>::new();
        let skipping = event.skip(2).unwrap();
        let (_a, first, _) = collect(&skipping);
        event.fire(1).unwrap();
        event.fire(2).unwrap();
        event.fire(3).unwrap();
        let (_b, second, _) = collect(&skipping);
        event.fire(4).unwrap();
        event.fire(5).unwrap();
        event.fire(6).unwrap();

        assert_eq!(first.lock().unwrap().as_slice(), [3, 4, 5, 6]);
        assert_eq!(second.lock().unwrap().as_slice(), [6]);
    }

    #[test]
    fn test_take_completes_and_unsubscribes() {
        let event = SimpleEvent::<i32>::new();
        let (sub, seen, completions) = collect(&event.take(2).unwrap());
        for v in 1..=4 {
            event.fire(v).unwrap();
        }
        assert_eq!(seen.lock().unwrap().as_slice(), [1, 2]);
        assert_eq!(*completions.lock().unwrap(), 1);
        assert!(sub.is_disposed());
        assert!(!event.has_observers());
    }

    #[test]
    fn test_take_forwards_upstream_completion() {
        let event = SimpleEvent::<i32>::new();
        let (_sub, seen, completions) = collect(&event.take(5).unwrap());
        event.fire(1).unwrap();
        event.on_completed(Completion::Success).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), [1]);
        assert_eq!(*completions.lock().unwrap(), 1);
    }
}
