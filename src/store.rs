//! The shared node arena of one factory.
//!
//! Both diagram variants keep their canonical nodes here: a growable arena
//! with slots 0 and 1 reserved for the LO/HI terminals, per-level subtables
//! for hash-consed lookup, and a free list so that swept slots are reused.
//! The variant-specific reduction rule fires in the manager *before* the
//! store is consulted, so the store never sees a node that reduction would
//! have eliminated.

use crate::bitset::BitSet;
use crate::node::Node;
use crate::ordering::VarOrdering;
use crate::subtable::Subtable;
use crate::types::{Level, NodeId, Var};

#[derive(Debug)]
pub struct NodeStore {
    /// Node storage. Index 0 = LO terminal, index 1 = HI terminal.
    nodes: Vec<Node>,
    /// Per-level subtables for unique-table lookup.
    subtables: Vec<Subtable>,
    /// Swept slots available for reuse.
    free: Vec<NodeId>,
    /// Number of live inner nodes.
    live: usize,
}

impl NodeStore {
    /// Creates a store for a factory with the given number of levels.
    pub fn new(num_levels: usize) -> Self {
        Self {
            nodes: vec![Node::default(); 2],
            subtables: vec![Subtable::default(); num_levels],
            free: Vec::new(),
            live: 0,
        }
    }

    /// Reads a node. Terminals read as vacant nodes.
    #[inline]
    pub fn node(&self, id: NodeId) -> Node {
        self.nodes[id.index()]
    }

    /// Number of live inner nodes.
    pub fn live_nodes(&self) -> usize {
        self.live
    }

    /// Total arena slots allocated so far (including freed ones).
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up the canonical node for `(level, lo, hi)`.
    pub fn lookup(&self, level: Level, lo: NodeId, hi: NodeId) -> Option<NodeId> {
        self.subtables[level.index()].find(lo, hi, &self.nodes)
    }

    /// Installs a fresh canonical node, reusing a freed slot if one exists.
    ///
    /// The caller must have applied the variant's reduction rule and checked
    /// [`lookup`](Self::lookup) first.
    pub fn install(&mut self, level: Level, var: Var, lo: NodeId, hi: NodeId) -> NodeId {
        let node = Node::new(var, lo, hi);
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            }
            None => {
                let id = NodeId::new(self.nodes.len() as u32);
                self.nodes.push(node);
                id
            }
        };
        self.subtables[level.index()].insert(lo, hi, id, &mut self.nodes);
        self.live += 1;
        id
    }

    /// Marks every node reachable from `roots` (terminals excluded).
    pub fn mark_reachable(&self, roots: impl IntoIterator<Item = NodeId>, mark: &mut BitSet) {
        let mut stack: Vec<NodeId> = roots.into_iter().filter(|id| !id.is_terminal()).collect();
        while let Some(id) = stack.pop() {
            if !mark.insert(id.index()) {
                continue;
            }
            let node = self.nodes[id.index()];
            if !node.lo.is_terminal() {
                stack.push(node.lo);
            }
            if !node.hi.is_terminal() {
                stack.push(node.hi);
            }
        }
    }

    /// Frees every inner node not present in `mark`. Returns the number of
    /// reclaimed nodes.
    pub fn sweep(&mut self, mark: &BitSet, ordering: &VarOrdering) -> usize {
        let mut freed = 0;
        for index in 2..self.nodes.len() {
            if self.nodes[index].is_vacant() || mark.contains(index) {
                continue;
            }
            let id = NodeId::new(index as u32);
            let level = ordering.level_of(self.nodes[index].var);
            let removed = self.subtables[level.index()].remove(id, &mut self.nodes);
            debug_assert!(removed, "live node missing from its subtable");
            self.nodes[index] = Node::default();
            self.free.push(id);
            self.live -= 1;
            freed += 1;
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_ordering() -> (NodeStore, VarOrdering) {
        (NodeStore::new(3), VarOrdering::new(&[0, 1, 2]).unwrap())
    }

    #[test]
    fn test_install_and_lookup() {
        let (mut store, _) = store_with_ordering();
        let level = Level::new(0);

        assert_eq!(store.lookup(level, NodeId::LO, NodeId::HI), None);
        let id = store.install(level, Var::new(0), NodeId::LO, NodeId::HI);
        assert_eq!(store.lookup(level, NodeId::LO, NodeId::HI), Some(id));
        assert_eq!(store.live_nodes(), 1);

        let node = store.node(id);
        assert_eq!(node.var, Var::new(0));
        assert_eq!(node.lo, NodeId::LO);
        assert_eq!(node.hi, NodeId::HI);
    }

    #[test]
    fn test_sweep_reclaims_unmarked() {
        let (mut store, ordering) = store_with_ordering();
        let a = store.install(Level::new(1), Var::new(1), NodeId::LO, NodeId::HI);
        let b = store.install(Level::new(0), Var::new(0), a, NodeId::HI);

        // Mark only the chain rooted at `b`.
        let mut mark = BitSet::new(store.arena_len());
        store.mark_reachable([b], &mut mark);
        assert_eq!(store.sweep(&mark, &ordering), 0);

        // Nothing marked: everything goes.
        let mark = BitSet::new(store.arena_len());
        assert_eq!(store.sweep(&mark, &ordering), 2);
        assert_eq!(store.live_nodes(), 0);
        assert_eq!(store.lookup(Level::new(1), NodeId::LO, NodeId::HI), None);
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let (mut store, ordering) = store_with_ordering();
        let a = store.install(Level::new(0), Var::new(0), NodeId::LO, NodeId::HI);
        let len_before = store.arena_len();

        let mark = BitSet::new(store.arena_len());
        store.sweep(&mark, &ordering);

        let b = store.install(Level::new(0), Var::new(0), NodeId::HI, NodeId::LO);
        assert_eq!(a, b); // same slot, recycled
        assert_eq!(store.arena_len(), len_before);
    }

    #[test]
    fn test_mark_reachable_follows_children() {
        let (mut store, _) = store_with_ordering();
        let leaf = store.install(Level::new(2), Var::new(2), NodeId::LO, NodeId::HI);
        let mid = store.install(Level::new(1), Var::new(1), leaf, NodeId::HI);
        let root = store.install(Level::new(0), Var::new(0), mid, leaf);

        let mut mark = BitSet::new(store.arena_len());
        store.mark_reachable([root], &mut mark);
        assert!(mark.contains(root.index()));
        assert!(mark.contains(mid.index()));
        assert!(mark.contains(leaf.index()));
        assert_eq!(mark.len(), 3);
    }
}
