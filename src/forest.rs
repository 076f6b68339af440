//! An intrusive, arena-indexed forest supporting O(1) re-parenting and
//! pre-order traversal.
//!
//! Grounded on `sdfpy/forest.py`'s `Node`/`Forest` (a sibling ring plus a
//! first-child pointer per node). The MCR engine
//! ([`crate::algo::mcr`]) re-roots whole subtrees on every pivot, so
//! re-parenting — unlinking a node from its current position and
//! reattaching it elsewhere — must be O(1) amortised; traversal of a
//! subtree must be proportional to the subtree's size.
//!
//! Nodes are referenced by dense `usize` index (an actor or marked-graph
//! vertex index), per the Design Notes' "represent nodes by index in an
//! arena".

/// One slot in the forest's node arena.
#[derive(Debug, Clone, Copy)]
struct Slot<E> {
    parent: Option<usize>,
    in_edge: Option<E>,
    first_child: Option<usize>,
    next_sibling: usize,
    prev_sibling: usize,
    present: bool,
}

impl<E: Copy> Slot<E> {
    fn isolated(id: usize) -> Self {
        Slot {
            parent: None,
            in_edge: None,
            first_child: None,
            next_sibling: id,
            prev_sibling: id,
            present: true,
        }
    }
}

/// An intrusive forest over dense node indices `0..capacity`.
///
/// `E` is the edge payload cached on the child's in-edge (for this crate,
/// an [`crate::error::EdgeRef`] `(u, v, key)` triple).
pub struct Forest<E> {
    slots: Vec<Slot<E>>,
}

impl<E: Copy> Forest<E> {
    /// Creates a forest over `capacity` nodes, all initially isolated
    /// roots.
    pub fn new(capacity: usize) -> Self {
        Forest {
            slots: (0..capacity).map(Slot::isolated).collect(),
        }
    }

    fn unlink(&mut self, child: usize) {
        let (next, prev) = {
            let slot = &self.slots[child];
            (slot.next_sibling, slot.prev_sibling)
        };
        if next != child {
            self.slots[prev].next_sibling = next;
            self.slots[next].prev_sibling = prev;
        }
        if let Some(parent) = self.slots[child].parent {
            if self.slots[parent].first_child == Some(child) {
                self.slots[parent].first_child = if next != child { Some(next) } else { None };
            }
        }
        self.slots[child].parent = None;
        self.slots[child].next_sibling = child;
        self.slots[child].prev_sibling = child;
    }

    fn append_child(&mut self, parent: usize, child: usize) {
        match self.slots[parent].first_child {
            None => {
                self.slots[parent].first_child = Some(child);
            }
            Some(first) => {
                let last_prev = self.slots[first].prev_sibling;
                self.slots[child].next_sibling = first;
                self.slots[first].prev_sibling = child;
                self.slots[last_prev].next_sibling = child;
                self.slots[child].prev_sibling = last_prev;
            }
        }
        self.slots[child].parent = Some(parent);
    }

    /// Attaches `child` under `parent`, caching `edge` as the child's
    /// in-edge. If `child` already had a parent, it is first unlinked from
    /// its previous position (re-parenting), in O(1).
    pub fn add_edge(&mut self, parent: usize, child: usize, edge: E) {
        self.unlink(child);
        self.append_child(parent, child);
        self.slots[child].in_edge = Some(edge);
    }

    /// Whether `node` has ever been added to the forest (always true for
    /// any index `< capacity`; present for symmetry with the Python
    /// `__contains__`, and to flag indices that are roots vs. attached).
    pub fn contains(&self, node: usize) -> bool {
        node < self.slots.len()
    }

    /// The in-edge of `child`, if it has a parent.
    pub fn parent_edge(&self, child: usize) -> Option<E> {
        self.slots[child].in_edge
    }

    /// The parent of `child`, if any.
    pub fn parent(&self, child: usize) -> Option<usize> {
        self.slots[child].parent
    }

    /// Children of `node`, in insertion order.
    pub fn children(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        ChildrenIter {
            forest: self,
            first: self.slots[node].first_child,
            current: self.slots[node].first_child,
            started: false,
        }
    }

    /// Pre-order walk of `root`'s subtree (including `root` itself).
    pub fn pre_order(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.pre_order_into(root, &mut out);
        out
    }

    fn pre_order_into(&self, node: usize, out: &mut Vec<usize>) {
        out.push(node);
        for child in self.children(node) {
            self.pre_order_into(child, out);
        }
    }

    /// Pre-order walk of `root`'s subtree's in-edges (excluding `root`,
    /// which has none within the subtree).
    pub fn pre_order_edges(&self, root: usize) -> Vec<E> {
        let mut out = Vec::new();
        self.pre_order_edges_into(root, &mut out);
        out
    }

    fn pre_order_edges_into(&self, node: usize, out: &mut Vec<E>) {
        for child in self.children(node) {
            if let Some(edge) = self.slots[child].in_edge {
                out.push(edge);
            }
            self.pre_order_edges_into(child, out);
        }
    }
}

struct ChildrenIter<'a, E> {
    forest: &'a Forest<E>,
    first: Option<usize>,
    current: Option<usize>,
    started: bool,
}

impl<'a, E: Copy> Iterator for ChildrenIter<'a, E> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.current?;
        if self.started && Some(current) == self.first {
            return None;
        }
        self.started = true;
        let next = self.forest.slots[current].next_sibling;
        self.current = Some(next);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chain_preorder() {
        let mut f: Forest<(usize, usize, u32)> = Forest::new(4);
        f.add_edge(0, 1, (0, 1, 0));
        f.add_edge(1, 2, (1, 2, 0));
        f.add_edge(1, 3, (1, 3, 0));
        assert_eq!(f.pre_order(0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn reparenting_moves_subtree() {
        let mut f: Forest<(usize, usize, u32)> = Forest::new(5);
        f.add_edge(0, 1, (0, 1, 0));
        f.add_edge(1, 2, (1, 2, 0));
        f.add_edge(0, 3, (0, 3, 0));
        assert_eq!(f.pre_order(0), vec![0, 1, 2, 3]);

        // re-parent node 1 (with its subtree {1,2}) under 3
        f.add_edge(3, 1, (3, 1, 0));
        assert_eq!(f.parent(1), Some(3));
        assert_eq!(f.pre_order(0), vec![0, 3, 1, 2]);
        assert_eq!(f.pre_order(3), vec![3, 1, 2]);
    }

    #[test]
    fn children_preserve_insertion_order() {
        let mut f: Forest<(usize, usize, u32)> = Forest::new(4);
        f.add_edge(0, 1, (0, 1, 0));
        f.add_edge(0, 2, (0, 2, 0));
        f.add_edge(0, 3, (0, 3, 0));
        assert_eq!(f.children(0).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn pre_order_edges_matches_pre_order_minus_root() {
        let mut f: Forest<(usize, usize, u32)> = Forest::new(3);
        f.add_edge(0, 1, (0, 1, 7));
        f.add_edge(1, 2, (1, 2, 9));
        assert_eq!(f.pre_order_edges(0), vec![(0, 1, 7), (1, 2, 9)]);
    }
}
