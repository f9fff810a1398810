//! The ZDD factory: zero-suppressed decision diagrams.
//!
//! A [`ZddManager`] wraps one universe graph of shared, reduced, ordered,
//! zero-suppressed nodes. A ZDD denotes a family of subsets of the
//! factory's universe `{0, .., N-1}`: an inner node `(var, lo, hi)` denotes
//! `lo ∪ { S ∪ {var} : S ∈ hi }`, the LO terminal denotes the empty family,
//! and the HI terminal denotes `{∅}`.
//!
//! The zero-suppression rule `hi == LO => lo` elides every variable that
//! appears in no set of the family, which keeps sparse families compact.
//!
//! # Quick Start
//!
//! ```
//! use dd_rs::zdd::ZddManager;
//!
//! let mgr = ZddManager::new(&[0, 1, 2, 3], 1 << 10).unwrap();
//!
//! let s1 = mgr.element(0).unwrap();         // {{0}}
//! let s2 = mgr.element(2).unwrap();         // {{2}}
//! let both = mgr.union(s1, s2).unwrap();    // {{0}, {2}}
//!
//! assert_eq!(mgr.count(both).unwrap(), 2);
//! ```

use std::cell::RefCell;
use std::cmp::Ordering as CmpOrdering;
use std::fmt;

use hashbrown::HashMap;
use log::debug;

use crate::bitset::BitSet;
use crate::cache::OpCache;
use crate::error::{DdError, Result};
use crate::node::Node;
use crate::ordering::VarOrdering;
use crate::store::NodeStore;
use crate::types::{Level, ManagerId, NodeId, Var};
use crate::utils::{pairing3, MyHash};

/// A handle onto one node of a [`ZddManager`]'s universe graph.
///
/// Because the graph is canonical, handle equality is extensional equality
/// of the denoted families.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ZddRef {
    mgr: ManagerId,
    node: NodeId,
}

impl ZddRef {
    pub(crate) fn new(mgr: ManagerId, node: NodeId) -> Self {
        Self { mgr, node }
    }

    pub(crate) fn manager_id(self) -> ManagerId {
        self.mgr
    }

    pub(crate) fn node_id(self) -> NodeId {
        self.node
    }

    /// Returns true if this handle denotes the empty family.
    pub fn is_empty_family(self) -> bool {
        self.node.is_lo()
    }

    /// Returns true if this handle denotes `{∅}`.
    pub fn is_base(self) -> bool {
        self.node.is_hi()
    }

    /// Returns true if this handle denotes a terminal.
    pub fn is_terminal(self) -> bool {
        self.node.is_terminal()
    }
}

impl fmt::Display for ZddRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)
    }
}

/// Set operator codes for the operation cache.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SetOp {
    Union = 1,
    Intersection = 2,
    Difference = 3,
    Subset1 = 4,
    Subset0 = 5,
    Change = 6,
}

/// Key into the ZDD operation cache.
///
/// `b` carries a node id for the binary node-node operators and a variable
/// id for the per-variable operators; the operator code disambiguates.
/// Union and intersection keys are commutativity-normalised; difference
/// keys keep their operand order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct ZddOpKey {
    op: SetOp,
    a: NodeId,
    b: u32,
}

impl ZddOpKey {
    fn commutative(op: SetOp, a: NodeId, b: NodeId) -> Self {
        let (a, b) = if a.raw() <= b.raw() { (a, b) } else { (b, a) };
        Self { op, a, b: b.raw() }
    }

    fn non_commutative(op: SetOp, a: NodeId, b: NodeId) -> Self {
        Self { op, a, b: b.raw() }
    }

    fn per_var(op: SetOp, a: NodeId, var: Var) -> Self {
        Self { op, a, b: var.id() }
    }
}

impl MyHash for ZddOpKey {
    fn hash(&self) -> u64 {
        pairing3(self.op as u64, self.a.raw() as u64, self.b as u64)
    }
}

/// The ZDD manager: owns the universe graph and performs all operations.
///
/// # Design
///
/// - **Sharing**: identical `(var, lo, hi)` nodes exist at most once
/// - **Zero-suppression**: no node has `hi == LO` (such nodes collapse
///   to `lo`)
/// - **Ordering**: every node's variable sits strictly above its children's
///   in the ordering supplied at construction
pub struct ZddManager {
    id: ManagerId,
    ordering: VarOrdering,
    store: RefCell<NodeStore>,
    cache: RefCell<OpCache<ZddOpKey, NodeId>>,
    count_cache: RefCell<HashMap<NodeId, u64>>,
}

impl ZddManager {
    /// Creates a factory over `ordering.len()` variables with the given
    /// variable ordering and operator-cache capacity (zero disables the
    /// cache).
    pub fn new(ordering: &[u32], cache_capacity: usize) -> Result<Self> {
        let ordering = VarOrdering::new(ordering)?;
        debug!(
            "new ZddManager: {} vars, cache capacity {}",
            ordering.num_vars(),
            cache_capacity
        );
        Ok(Self {
            id: ManagerId::fresh(),
            store: RefCell::new(NodeStore::new(ordering.num_vars())),
            ordering,
            cache: RefCell::new(OpCache::new(cache_capacity)),
            count_cache: RefCell::new(HashMap::new()),
        })
    }

    /// The size of the universe.
    pub fn num_vars(&self) -> usize {
        self.ordering.num_vars()
    }

    /// The variable ordering as originally supplied.
    pub fn ordering(&self) -> Vec<u32> {
        self.ordering.as_permutation()
    }

    /// The number of live nodes in the universe graph.
    pub fn size(&self) -> usize {
        self.store.borrow().live_nodes()
    }

    pub(crate) fn ordering_ref(&self) -> &VarOrdering {
        &self.ordering
    }

    pub(crate) fn node_at(&self, id: NodeId) -> Node {
        self.store.borrow().node(id)
    }

    pub(crate) fn wrap(&self, node: NodeId) -> ZddRef {
        ZddRef::new(self.id, node)
    }

    /// Validates that `f` belongs to this factory.
    pub(crate) fn check(&self, f: ZddRef) -> Result<NodeId> {
        if f.manager_id() != self.id {
            return Err(DdError::invalid_argument(
                "ZDDs must come from the same factory",
            ));
        }
        Ok(f.node_id())
    }

    fn check_var(&self, var: u32) -> Result<Var> {
        if !self.ordering.in_range(var) {
            return Err(DdError::invalid_argument(format!("No such variable: {}", var)));
        }
        Ok(Var::new(var))
    }

    /// The ordering level of a node; terminals compare below every level.
    fn level_of_node(&self, id: NodeId) -> Level {
        if id.is_terminal() {
            Level::TERMINAL
        } else {
            self.ordering.level_of(self.node_at(id).var)
        }
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// The empty family: contains no sets.
    pub fn empty(&self) -> ZddRef {
        self.wrap(NodeId::LO)
    }

    /// The family containing only the empty set: `{∅}`.
    pub fn base(&self) -> ZddRef {
        self.wrap(NodeId::HI)
    }

    /// The family `{{var}}` containing the single singleton set.
    pub fn element(&self, var: u32) -> Result<ZddRef> {
        let var = self.check_var(var)?;
        Ok(self.wrap(self.mk_node(var, NodeId::LO, NodeId::HI)))
    }

    /// The family containing exactly the given set: `{{v1, .., vk}}`.
    /// Duplicate elements are allowed and collapse.
    pub fn set_of(&self, vars: &[u32]) -> Result<ZddRef> {
        let mut levels = Vec::with_capacity(vars.len());
        for &v in vars {
            levels.push(self.ordering.level_of(self.check_var(v)?));
        }
        levels.sort_unstable();
        levels.dedup();

        // Build from the bottom of the ordering up.
        let mut current = NodeId::HI;
        for &level in levels.iter().rev() {
            current = self.mk_node(self.ordering.var_at(level), NodeId::LO, current);
        }
        Ok(self.wrap(current))
    }

    /// Builds the family containing exactly the given sets.
    ///
    /// The construction recurses over the variable ordering: at each level
    /// the family is partitioned into the sets containing the level's
    /// variable and those without it; levels whose variable appears in no
    /// set are skipped by zero-suppression.
    pub fn family(&self, sets: &[Vec<u32>]) -> Result<ZddRef> {
        // Normalise each set to its sorted, deduplicated level indices.
        let mut normalised: Vec<Vec<u32>> = Vec::with_capacity(sets.len());
        for set in sets {
            let mut levels = Vec::with_capacity(set.len());
            for &v in set {
                levels.push(self.ordering.level_of(self.check_var(v)?).raw());
            }
            levels.sort_unstable();
            levels.dedup();
            normalised.push(levels);
        }

        let slices: Vec<&[u32]> = normalised.iter().map(|s| s.as_slice()).collect();
        Ok(self.wrap(self.family_at(0, &slices)))
    }

    fn family_at(&self, level: u32, sets: &[&[u32]]) -> NodeId {
        if sets.is_empty() {
            return NodeId::LO;
        }
        if level == self.num_vars() as u32 {
            // Every surviving set has been fully consumed; duplicates
            // collapse into the single empty set.
            return NodeId::HI;
        }

        let mut without: Vec<&[u32]> = Vec::new();
        let mut with: Vec<&[u32]> = Vec::new();
        for &set in sets {
            match set.first() {
                Some(&l) if l == level => with.push(&set[1..]),
                _ => without.push(set),
            }
        }

        let lo = self.family_at(level + 1, &without);
        let hi = self.family_at(level + 1, &with);
        self.mk_node(self.ordering.var_at(Level::new(level)), lo, hi)
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    /// Returns the shared node for `(var, lo, hi)`, applying the
    /// zero-suppression rule `hi == LO => lo`. All sharing and reduction
    /// funnels through here.
    pub(crate) fn mk_node(&self, var: Var, lo: NodeId, hi: NodeId) -> NodeId {
        // Zero-suppression
        if hi.is_lo() {
            return lo;
        }

        let level = self.ordering.level_of(var);
        debug_assert!(!level.is_terminal());
        debug_assert!(level < self.level_of_node(lo));
        debug_assert!(level < self.level_of_node(hi));

        // Node sharing
        let mut store = self.store.borrow_mut();
        if let Some(id) = store.lookup(level, lo, hi) {
            return id;
        }
        store.install(level, var, lo, hi)
    }

    // ========================================================================
    // Set-theoretic operators
    // ========================================================================

    /// Union: sets in either family.
    pub fn union(&self, f: ZddRef, g: ZddRef) -> Result<ZddRef> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok(self.wrap(self.apply_union(f, g)))
    }

    /// Intersection: sets in both families.
    pub fn intersection(&self, f: ZddRef, g: ZddRef) -> Result<ZddRef> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok(self.wrap(self.apply_intersection(f, g)))
    }

    /// Difference: sets in `f` but not in `g`.
    pub fn difference(&self, f: ZddRef, g: ZddRef) -> Result<ZddRef> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok(self.wrap(self.apply_difference(f, g)))
    }

    fn apply_union(&self, f: NodeId, g: NodeId) -> NodeId {
        if f.is_lo() {
            return g;
        }
        if g.is_lo() || f == g {
            return f;
        }

        let key = ZddOpKey::commutative(SetOp::Union, f, g);
        if let Some(res) = self.cache.borrow().get(&key) {
            return res;
        }

        // Terminals sit below every level, so a HI operand flows through
        // the ordinary top-variable split.
        let f_level = self.level_of_node(f);
        let g_level = self.level_of_node(g);
        let res = match f_level.cmp(&g_level) {
            CmpOrdering::Less => {
                let f_node = self.node_at(f);
                let lo = self.apply_union(f_node.lo, g);
                self.mk_node(f_node.var, lo, f_node.hi)
            }
            CmpOrdering::Greater => {
                let g_node = self.node_at(g);
                let lo = self.apply_union(f, g_node.lo);
                self.mk_node(g_node.var, lo, g_node.hi)
            }
            CmpOrdering::Equal => {
                let f_node = self.node_at(f);
                let g_node = self.node_at(g);
                let lo = self.apply_union(f_node.lo, g_node.lo);
                let hi = self.apply_union(f_node.hi, g_node.hi);
                self.mk_node(f_node.var, lo, hi)
            }
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    fn apply_intersection(&self, f: NodeId, g: NodeId) -> NodeId {
        if f.is_lo() || g.is_lo() {
            return NodeId::LO;
        }
        if f == g {
            return f;
        }

        let key = ZddOpKey::commutative(SetOp::Intersection, f, g);
        if let Some(res) = self.cache.borrow().get(&key) {
            return res;
        }

        let f_level = self.level_of_node(f);
        let g_level = self.level_of_node(g);
        let res = match f_level.cmp(&g_level) {
            CmpOrdering::Less => {
                // f's variable is in no set of g: only f's lo branch can
                // contribute.
                self.apply_intersection(self.node_at(f).lo, g)
            }
            CmpOrdering::Greater => self.apply_intersection(f, self.node_at(g).lo),
            CmpOrdering::Equal => {
                let f_node = self.node_at(f);
                let g_node = self.node_at(g);
                let lo = self.apply_intersection(f_node.lo, g_node.lo);
                let hi = self.apply_intersection(f_node.hi, g_node.hi);
                self.mk_node(f_node.var, lo, hi)
            }
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    fn apply_difference(&self, f: NodeId, g: NodeId) -> NodeId {
        if f.is_lo() || f == g {
            return NodeId::LO;
        }
        if g.is_lo() {
            return f;
        }

        let key = ZddOpKey::non_commutative(SetOp::Difference, f, g);
        if let Some(res) = self.cache.borrow().get(&key) {
            return res;
        }

        let f_level = self.level_of_node(f);
        let g_level = self.level_of_node(g);
        let res = match f_level.cmp(&g_level) {
            CmpOrdering::Less => {
                let f_node = self.node_at(f);
                let lo = self.apply_difference(f_node.lo, g);
                self.mk_node(f_node.var, lo, f_node.hi)
            }
            CmpOrdering::Greater => self.apply_difference(f, self.node_at(g).lo),
            CmpOrdering::Equal => {
                let f_node = self.node_at(f);
                let g_node = self.node_at(g);
                let lo = self.apply_difference(f_node.lo, g_node.lo);
                let hi = self.apply_difference(f_node.hi, g_node.hi);
                self.mk_node(f_node.var, lo, hi)
            }
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    // ========================================================================
    // Per-variable operators
    // ========================================================================

    /// The subfamily of sets containing `var`, with `var` removed from
    /// each.
    pub fn subset1(&self, f: ZddRef, var: u32) -> Result<ZddRef> {
        let f = self.check(f)?;
        let var = self.check_var(var)?;
        Ok(self.wrap(self.apply_subset1(f, var)))
    }

    /// The subfamily of sets not containing `var`.
    pub fn subset0(&self, f: ZddRef, var: u32) -> Result<ZddRef> {
        let f = self.check(f)?;
        let var = self.check_var(var)?;
        Ok(self.wrap(self.apply_subset0(f, var)))
    }

    /// Toggles the presence of `var` in every set of the family.
    pub fn change(&self, f: ZddRef, var: u32) -> Result<ZddRef> {
        let f = self.check(f)?;
        let var = self.check_var(var)?;
        Ok(self.wrap(self.apply_change(f, var)))
    }

    fn apply_subset1(&self, f: NodeId, var: Var) -> NodeId {
        let var_level = self.ordering.level_of(var);
        let f_level = self.level_of_node(f);
        if f_level > var_level {
            // var is decided above this node: no set here contains it.
            return NodeId::LO;
        }
        let f_node = self.node_at(f);
        if f_node.var == var {
            return f_node.hi;
        }

        let key = ZddOpKey::per_var(SetOp::Subset1, f, var);
        if let Some(res) = self.cache.borrow().get(&key) {
            return res;
        }

        let lo = self.apply_subset1(f_node.lo, var);
        let hi = self.apply_subset1(f_node.hi, var);
        let res = self.mk_node(f_node.var, lo, hi);

        self.cache.borrow_mut().insert(key, res);
        res
    }

    fn apply_subset0(&self, f: NodeId, var: Var) -> NodeId {
        let var_level = self.ordering.level_of(var);
        let f_level = self.level_of_node(f);
        if f_level > var_level {
            return f;
        }
        let f_node = self.node_at(f);
        if f_node.var == var {
            return f_node.lo;
        }

        let key = ZddOpKey::per_var(SetOp::Subset0, f, var);
        if let Some(res) = self.cache.borrow().get(&key) {
            return res;
        }

        let lo = self.apply_subset0(f_node.lo, var);
        let hi = self.apply_subset0(f_node.hi, var);
        let res = self.mk_node(f_node.var, lo, hi);

        self.cache.borrow_mut().insert(key, res);
        res
    }

    fn apply_change(&self, f: NodeId, var: Var) -> NodeId {
        let var_level = self.ordering.level_of(var);
        let f_level = self.level_of_node(f);
        if f_level > var_level {
            // var is absent from every set: add it to all of them.
            return self.mk_node(var, NodeId::LO, f);
        }
        let f_node = self.node_at(f);
        if f_node.var == var {
            return self.mk_node(var, f_node.hi, f_node.lo);
        }

        let key = ZddOpKey::per_var(SetOp::Change, f, var);
        if let Some(res) = self.cache.borrow().get(&key) {
            return res;
        }

        let lo = self.apply_change(f_node.lo, var);
        let hi = self.apply_change(f_node.hi, var);
        let res = self.mk_node(f_node.var, lo, hi);

        self.cache.borrow_mut().insert(key, res);
        res
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The number of sets in the family.
    pub fn count(&self, f: ZddRef) -> Result<u64> {
        let f = self.check(f)?;
        Ok(self.count_rec(f))
    }

    fn count_rec(&self, f: NodeId) -> u64 {
        if f.is_lo() {
            return 0;
        }
        if f.is_hi() {
            return 1;
        }

        if let Some(&cached) = self.count_cache.borrow().get(&f) {
            return cached;
        }

        let node = self.node_at(f);
        // No 2^k adjustment: an elided variable means "absent", not
        // "don't care".
        let res = self.count_rec(node.lo) + self.count_rec(node.hi);

        self.count_cache.borrow_mut().insert(f, res);
        res
    }

    /// Returns true if the family contains the empty set.
    pub fn contains_empty(&self, f: ZddRef) -> Result<bool> {
        let mut cur = self.check(f)?;
        // The empty set lives at the end of the all-lo path.
        while !cur.is_terminal() {
            cur = self.node_at(cur).lo;
        }
        Ok(cur.is_hi())
    }

    /// Returns true if the family contains exactly the given set.
    pub fn contains(&self, f: ZddRef, set: &[u32]) -> Result<bool> {
        let mut cur = self.check(f)?;
        let mut levels = Vec::with_capacity(set.len());
        for &v in set {
            levels.push(self.ordering.level_of(self.check_var(v)?));
        }
        levels.sort_unstable();
        levels.dedup();

        let mut next = 0;
        loop {
            if next == levels.len() {
                // All required elements matched; the set is present iff the
                // remaining lo-path reaches HI.
                while !cur.is_terminal() {
                    cur = self.node_at(cur).lo;
                }
                return Ok(cur.is_hi());
            }
            let target = levels[next];
            match self.level_of_node(cur).cmp(&target) {
                CmpOrdering::Less => cur = self.node_at(cur).lo,
                CmpOrdering::Equal => {
                    cur = self.node_at(cur).hi;
                    next += 1;
                }
                // The diagram skipped the wanted element.
                CmpOrdering::Greater => return Ok(false),
            }
        }
    }

    /// The number of inner nodes of one diagram.
    pub fn node_count(&self, f: ZddRef) -> Result<usize> {
        let f = self.check(f)?;
        let mut visited = BitSet::new(self.store.borrow().arena_len());
        let mut stack = vec![f];
        let mut count = 0;
        while let Some(id) = stack.pop() {
            if id.is_terminal() || !visited.insert(id.index()) {
                continue;
            }
            count += 1;
            let node = self.node_at(id);
            stack.push(node.lo);
            stack.push(node.hi);
        }
        Ok(count)
    }

    // ========================================================================
    // Stringification and reclamation
    // ========================================================================

    /// Structural rendering: `var(lo,hi)` with `LO`/`HI` at the leaves.
    pub fn to_bracket_string(&self, f: ZddRef) -> Result<String> {
        let node = self.check(f)?;
        Ok(self.bracket(node))
    }

    fn bracket(&self, id: NodeId) -> String {
        if id.is_lo() {
            return "LO".to_string();
        }
        if id.is_hi() {
            return "HI".to_string();
        }
        let node = self.node_at(id);
        format!("{}({},{})", node.var.id(), self.bracket(node.lo), self.bracket(node.hi))
    }

    /// Reclaims every node unreachable from the given roots.
    ///
    /// Handles not passed as roots are invalidated by this call; the
    /// operation caches are flushed so no reclaimed node can be served from
    /// them. Returns the number of reclaimed nodes.
    pub fn collect_garbage(&self, roots: &[ZddRef]) -> Result<usize> {
        let mut root_nodes = Vec::with_capacity(roots.len());
        for &r in roots {
            root_nodes.push(self.check(r)?);
        }

        let store = self.store.borrow();
        let mut mark = BitSet::new(store.arena_len());
        store.mark_reachable(root_nodes, &mut mark);
        drop(store);

        let freed = self.store.borrow_mut().sweep(&mark, &self.ordering);
        self.cache.borrow_mut().invalidate_all();
        self.count_cache.borrow_mut().clear();

        debug!("collect_garbage: freed {} nodes, {} live", freed, self.size());
        Ok(freed)
    }
}

impl fmt::Debug for ZddManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZddManager")
            .field("num_vars", &self.num_vars())
            .field("live_nodes", &self.size())
            .finish()
    }
}
