//! An indexed binary min-heap keyed on `usize` node ids.
//!
//! Grounded on `sdfpy/priorityq.py`'s `PriorityQueue(dict)`: a heap array
//! paired with a position lookup table so a node's key can be decreased (or
//! the node deleted) without a linear scan. Ordering compares only the
//! first component of the stored value — the parametric "distance" tuple
//! `(weight, tokens)` used throughout [`crate::algo::mcr`] orders strictly
//! on `weight`, with `tokens` carried along as a tie-break payload only
//! when the caller asks for it via [`IndexedPriorityQueue::peek`].

use indexmap::IndexMap;

/// A min-heap over `usize` keys, each carrying a `V` whose `Ord`
/// implementation (not a component of it) determines heap order.
///
/// Unlike `sdfpy`'s queue, which special-cased comparison to a tuple's
/// first element, callers here supply a `V` that already orders the way
/// they want (e.g. wrapping a `BigRational` and ignoring a second field),
/// keeping the heap itself generic.
pub struct IndexedPriorityQueue<V: Ord + Clone> {
    heap: Vec<usize>,
    position: IndexMap<usize, usize>,
    values: IndexMap<usize, V>,
}

impl<V: Ord + Clone> Default for IndexedPriorityQueue<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Ord + Clone> IndexedPriorityQueue<V> {
    pub fn new() -> Self {
        IndexedPriorityQueue {
            heap: Vec::new(),
            position: IndexMap::new(),
            values: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.position.contains_key(&node)
    }

    pub fn get(&self, node: usize) -> Option<&V> {
        self.values.get(&node)
    }

    /// Inserts `node` with `value`, or updates its value if already
    /// present, re-heapifying either up or down as needed.
    pub fn set(&mut self, node: usize, value: V) {
        if let Some(&pos) = self.position.get(&node) {
            let old = self.values.insert(node, value).expect("value must exist");
            let went_down = self.values[&node] < old;
            if went_down {
                self.swim(pos);
            } else {
                self.sink(pos);
            }
            return;
        }
        let pos = self.heap.len();
        self.heap.push(node);
        self.position.insert(node, pos);
        self.values.insert(node, value);
        self.swim(pos);
    }

    /// Removes and returns the `(node, value)` pair with the smallest
    /// value.
    pub fn pop(&mut self) -> Option<(usize, V)> {
        if self.heap.is_empty() {
            return None;
        }
        let top = self.heap[0];
        let value = self.values.swap_remove(&top).expect("heap/value mismatch");
        self.position.swap_remove(&top);

        let last = self.heap.pop().expect("heap is non-empty");
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.position.insert(last, 0);
            self.sink(0);
        }
        Some((top, value))
    }

    /// Removes `node` from the queue entirely, regardless of its position.
    pub fn delete(&mut self, node: usize) -> Option<V> {
        let pos = *self.position.get(&node)?;
        let value = self.values.swap_remove(&node).expect("heap/value mismatch");
        self.position.swap_remove(&node);

        let last_pos = self.heap.len() - 1;
        self.heap.swap(pos, last_pos);
        self.heap.pop();
        if pos < self.heap.len() {
            self.position.insert(self.heap[pos], pos);
            self.swim(pos);
            self.sink(pos);
        }
        Some(value)
    }

    fn swim(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.less(pos, parent) {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sink(&mut self, mut pos: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = 2 * pos + 2;
            let mut smallest = pos;
            if left < n && self.less(left, smallest) {
                smallest = left;
            }
            if right < n && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn less(&self, a: usize, b: usize) -> bool {
        let node_a = self.heap[a];
        let node_b = self.heap[b];
        self.values[&node_a] < self.values[&node_b]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.position.insert(self.heap[a], a);
        self.position.insert(self.heap[b], b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_ascending_order() {
        let mut q = IndexedPriorityQueue::new();
        q.set(0, 5);
        q.set(1, 1);
        q.set(2, 3);
        q.set(3, 2);

        let mut out = Vec::new();
        while let Some((node, _)) = q.pop() {
            out.push(node);
        }
        assert_eq!(out, vec![1, 3, 2, 0]);
    }

    #[test]
    fn set_updates_existing_key() {
        let mut q = IndexedPriorityQueue::new();
        q.set(0, 10);
        q.set(1, 20);
        q.set(1, 1); // decrease
        assert_eq!(q.pop(), Some((1, 1)));
        assert_eq!(q.pop(), Some((0, 10)));
    }

    #[test]
    fn delete_removes_arbitrary_entry() {
        let mut q = IndexedPriorityQueue::new();
        q.set(0, 5);
        q.set(1, 1);
        q.set(2, 3);
        assert_eq!(q.delete(1), Some(1));
        assert!(!q.contains(1));
        assert_eq!(q.pop(), Some((2, 3)));
        assert_eq!(q.pop(), Some((0, 5)));
    }

    #[test]
    fn empty_queue_pops_none() {
        let mut q: IndexedPriorityQueue<i64> = IndexedPriorityQueue::new();
        assert_eq!(q.pop(), None);
    }
}
