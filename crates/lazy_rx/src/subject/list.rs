//! Insertion-ordered observer registry

use crate::observer::Observer;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::sync::Arc;

new_key_type! {
    /// Handle to a registered observer
    pub(crate) struct NodeKey;
}

/// Observers captured for one delivery pass
pub(crate) type Snapshot<T> = SmallVec<[Arc<Observer<T>>; 4]>;

struct Node<T> {
    observer: Arc<Observer<T>>,
    prev: Option<NodeKey>,
    next: Option<NodeKey>,
}

/// Doubly linked list stored in a slot arena.
///
/// Appends and removals by key are O(1); iteration follows insertion order.
pub(crate) struct ObserverList<T> {
    nodes: SlotMap<NodeKey, Node<T>>,
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
}

impl<T> ObserverList<T> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub fn push_back(&mut self, observer: Arc<Observer<T>>) -> NodeKey {
        let key = self.nodes.insert(Node {
            observer,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    /// Unlink a node; stale keys are ignored
    pub fn remove(&mut self, key: NodeKey) -> Option<Arc<Observer<T>>> {
        let node = self.nodes.remove(key)?;
        match node.prev {
            Some(prev) => self.nodes[prev].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.nodes[next].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node.observer)
    }

    /// Observers from head to tail
    pub fn snapshot(&self) -> Snapshot<T> {
        let mut out = Snapshot::new();
        let mut cursor = self.head;
        while let Some(key) = cursor {
            let node = &self.nodes[key];
            out.push(Arc::clone(&node.observer));
            cursor = node.next;
        }
        out
    }

    /// Empty the list, returning the observers in order
    pub fn take_all(&mut self) -> Snapshot<T> {
        let out = self.snapshot();
        self.clear();
        out
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Panics if the prev/next links are inconsistent
    #[cfg(test)]
    pub fn check_links(&self) {
        let mut count = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(key) = cursor {
            let node = &self.nodes[key];
            assert_eq!(node.prev, prev, "broken prev link");
            prev = Some(key);
            cursor = node.next;
            count += 1;
        }
        assert_eq!(self.tail, prev, "tail does not match last node");
        assert_eq!(count, self.nodes.len(), "unreachable nodes in arena");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer() -> Arc<Observer<i32>> {
        Observer::from_fn(|_| {})
    }

    fn order(list: &ObserverList<i32>, all: &[Arc<Observer<i32>>]) -> Vec<usize> {
        list.snapshot()
            .iter()
            .map(|o| all.iter().position(|a| Arc::ptr_eq(a, o)).unwrap())
            .collect()
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut list = ObserverList::new();
        let all: Vec<_> = (0..5).map(|_| observer()).collect();
        for o in &all {
            list.push_back(o.clone());
        }
        list.check_links();
        assert_eq!(order(&list, &all), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut list = ObserverList::new();
        let all: Vec<_> = (0..5).map(|_| observer()).collect();
        let keys: Vec<_> = all.iter().map(|o| list.push_back(o.clone())).collect();

        assert!(list.remove(keys[2]).is_some());
        list.check_links();
        assert!(list.remove(keys[0]).is_some());
        list.check_links();
        assert!(list.remove(keys[4]).is_some());
        list.check_links();
        assert_eq!(order(&list, &all), [1, 3]);

        // Stale key
        assert!(list.remove(keys[2]).is_none());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_everything_then_reuse() {
        let mut list = ObserverList::new();
        let a = list.push_back(observer());
        let b = list.push_back(observer());
        list.remove(b);
        list.remove(a);
        list.check_links();
        assert!(list.is_empty());

        list.push_back(observer());
        list.check_links();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_take_all_empties_list() {
        let mut list = ObserverList::new();
        list.push_back(observer());
        list.push_back(observer());
        assert_eq!(list.take_all().len(), 2);
        list.check_links();
        assert!(list.is_empty());
    }

    #[test]
    fn test_interleaved_push_and_remove_match_vec_model() {
        let mut list = ObserverList::new();
        let mut model: Vec<(NodeKey, Arc<Observer<i32>>)> = Vec::new();
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..300 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            if model.is_empty() || seed % 3 != 0 {
                let o = observer();
                model.push((list.push_back(o.clone()), o));
            } else {
                let (key, o) = model.remove((seed as usize >> 4) % model.len());
                assert!(Arc::ptr_eq(&list.remove(key).unwrap(), &o));
            }
            list.check_links();
            let expected: Vec<_> = model.iter().map(|(_, o)| o.clone()).collect();
            assert!(list.snapshot().iter().zip(&expected).all(|(a, b)| Arc::ptr_eq(a, b)));
            assert_eq!(list.len(), expected.len());
        }
    }
}
