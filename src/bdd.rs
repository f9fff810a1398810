//! The BDD factory: reduced ordered binary decision diagrams.
//!
//! A [`BddManager`] wraps one universe graph of shared, reduced, ordered
//! BDD nodes. Every operation goes through the manager; handles ([`BddRef`])
//! are lightweight references onto nodes of the shared graph, and two
//! handles of the same factory denote the same Boolean function exactly
//! when they are equal.
//!
//! # Quick Start
//!
//! ```
//! use dd_rs::bdd::BddManager;
//!
//! let mgr = BddManager::new(&[0, 1, 2], 1 << 10).unwrap();
//!
//! let a = mgr.hi_var(0).unwrap();
//! let not_b = mgr.lo_var(1).unwrap();
//! let f = mgr.and(a, not_b).unwrap();
//!
//! assert_eq!(mgr.sat_count(f).unwrap(), 2); // x2 is a don't-care
//! ```

use std::cell::RefCell;
use std::cmp::Ordering as CmpOrdering;
use std::fmt;

use hashbrown::HashMap;
use log::debug;
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::bitset::BitSet;
use crate::cache::OpCache;
use crate::error::{DdError, Result};
use crate::node::Node;
use crate::ordering::VarOrdering;
use crate::store::NodeStore;
use crate::types::{Level, ManagerId, NodeId, Var};
use crate::utils::{pairing3, MyHash};

/// A handle onto one node of a [`BddManager`]'s universe graph.
///
/// Handles are cheap `Copy` values carrying the owning factory's identity.
/// Because the graph is canonical, handle equality is extensional equality
/// of the denoted functions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BddRef {
    mgr: ManagerId,
    node: NodeId,
}

impl BddRef {
    pub(crate) fn new(mgr: ManagerId, node: NodeId) -> Self {
        Self { mgr, node }
    }

    pub(crate) fn manager_id(self) -> ManagerId {
        self.mgr
    }

    pub(crate) fn node_id(self) -> NodeId {
        self.node
    }

    /// Returns true if this handle denotes the constant "false".
    pub fn is_lo(self) -> bool {
        self.node.is_lo()
    }

    /// Returns true if this handle denotes the constant "true".
    pub fn is_hi(self) -> bool {
        self.node.is_hi()
    }

    /// Returns true if this handle denotes a constant.
    pub fn is_terminal(self) -> bool {
        self.node.is_terminal()
    }
}

impl fmt::Display for BddRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)
    }
}

/// Boolean operator codes for the operation cache.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum BoolOp {
    Not = 1,
    And = 2,
    Or = 3,
    Xor = 4,
}

/// Key into the BDD operation cache.
///
/// For the commutative operators the operand order is normalised so that
/// `(a, b)` and `(b, a)` share one slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct BddOpKey {
    op: BoolOp,
    a: NodeId,
    b: NodeId,
}

impl BddOpKey {
    fn unary(op: BoolOp, a: NodeId) -> Self {
        Self { op, a, b: NodeId::NONE }
    }

    fn commutative(op: BoolOp, a: NodeId, b: NodeId) -> Self {
        let (a, b) = if a.raw() <= b.raw() { (a, b) } else { (b, a) };
        Self { op, a, b }
    }
}

impl MyHash for BddOpKey {
    fn hash(&self) -> u64 {
        pairing3(self.op as u64, self.a.raw() as u64, self.b.raw() as u64)
    }
}

/// The BDD manager: owns the universe graph and performs all operations.
///
/// # Design
///
/// - **Sharing**: identical `(var, lo, hi)` nodes exist at most once
/// - **Reduction**: no node has `lo == hi` (such nodes collapse to `lo`)
/// - **Ordering**: every node's variable sits strictly above its children's
///   in the ordering supplied at construction
///
/// The manager is single-threaded; interior mutability keeps the whole API
/// on `&self`. Distinct managers are fully independent.
pub struct BddManager {
    id: ManagerId,
    ordering: VarOrdering,
    store: RefCell<NodeStore>,
    cache: RefCell<OpCache<BddOpKey, NodeId>>,
    count_cache: RefCell<HashMap<NodeId, u64>>,
}

impl BddManager {
    /// Creates a factory over `ordering.len()` variables with the given
    /// variable ordering and operator-cache capacity (zero disables the
    /// cache).
    pub fn new(ordering: &[u32], cache_capacity: usize) -> Result<Self> {
        let ordering = VarOrdering::new(ordering)?;
        debug!(
            "new BddManager: {} vars, cache capacity {}",
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

    /// The number of variables of this factory.
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

    pub(crate) fn wrap(&self, node: NodeId) -> BddRef {
        BddRef::new(self.id, node)
    }

    /// Validates that `f` belongs to this factory.
    pub(crate) fn check(&self, f: BddRef) -> Result<NodeId> {
        if f.manager_id() != self.id {
            return Err(DdError::invalid_argument(
                "BDDs must come from the same factory",
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

    fn level(&self, node: &Node) -> Level {
        self.ordering.level_of(node.var)
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// The constant "false".
    pub fn lo(&self) -> BddRef {
        self.wrap(NodeId::LO)
    }

    /// The constant "true".
    pub fn hi(&self) -> BddRef {
        self.wrap(NodeId::HI)
    }

    /// The single-variable function `var`.
    pub fn hi_var(&self, var: u32) -> Result<BddRef> {
        let var = self.check_var(var)?;
        Ok(self.wrap(self.mk_node(var, NodeId::LO, NodeId::HI)))
    }

    /// The single-variable function `NOT var`.
    pub fn lo_var(&self, var: u32) -> Result<BddRef> {
        let var = self.check_var(var)?;
        Ok(self.wrap(self.mk_node(var, NodeId::HI, NodeId::LO)))
    }

    /// The conjunction of per-variable literals: the function that is true
    /// exactly on the given assignment. `values[v]` is the value of
    /// variable `v`.
    pub fn assignment(&self, values: &[bool]) -> Result<BddRef> {
        if values.len() != self.num_vars() {
            return Err(DdError::invalid_argument(
                "Assignment length should match the number of variables",
            ));
        }
        // Build bottom-up along the ordering; each level contributes one
        // literal node.
        let mut current = NodeId::HI;
        for index in (0..self.num_vars() as u32).rev() {
            let var = self.ordering.var_at(Level::new(index));
            current = if values[var.id() as usize] {
                self.mk_node(var, NodeId::LO, current)
            } else {
                self.mk_node(var, current, NodeId::LO)
            };
        }
        Ok(self.wrap(current))
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    /// Returns the shared node for `(var, lo, hi)`, applying the reduction
    /// rule `lo == hi => lo`. All sharing and reduction funnels through
    /// here.
    pub(crate) fn mk_node(&self, var: Var, lo: NodeId, hi: NodeId) -> NodeId {
        // Node elimination
        if lo == hi {
            return lo;
        }

        let level = self.ordering.level_of(var);
        debug_assert!(!level.is_terminal());
        debug_assert!(level < self.ordering.level_of(self.node_at(lo).var));
        debug_assert!(level < self.ordering.level_of(self.node_at(hi).var));

        // Node sharing
        let mut store = self.store.borrow_mut();
        if let Some(id) = store.lookup(level, lo, hi) {
            return id;
        }
        store.install(level, var, lo, hi)
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// Logical NOT.
    pub fn not(&self, f: BddRef) -> Result<BddRef> {
        let f = self.check(f)?;
        Ok(self.wrap(self.apply_not(f)))
    }

    /// Logical AND.
    pub fn and(&self, f: BddRef, g: BddRef) -> Result<BddRef> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok(self.wrap(self.apply_binary(BoolOp::And, f, g)))
    }

    /// Logical OR.
    pub fn or(&self, f: BddRef, g: BddRef) -> Result<BddRef> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok(self.wrap(self.apply_binary(BoolOp::Or, f, g)))
    }

    /// Logical XOR.
    pub fn xor(&self, f: BddRef, g: BddRef) -> Result<BddRef> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok(self.wrap(self.apply_binary(BoolOp::Xor, f, g)))
    }

    fn apply_not(&self, f: NodeId) -> NodeId {
        if f.is_lo() {
            return NodeId::HI;
        }
        if f.is_hi() {
            return NodeId::LO;
        }

        let key = BddOpKey::unary(BoolOp::Not, f);
        if let Some(res) = self.cache.borrow().get(&key) {
            return res;
        }

        let node = self.node_at(f);
        let lo = self.apply_not(node.lo);
        let hi = self.apply_not(node.hi);
        let res = self.mk_node(node.var, lo, hi);

        self.cache.borrow_mut().insert(key, res);
        res
    }

    fn apply_binary(&self, op: BoolOp, f: NodeId, g: NodeId) -> NodeId {
        // Terminal and idempotence short-circuits. After these, both
        // operands are inner nodes.
        match op {
            BoolOp::And => {
                if f == g {
                    return f;
                }
                if f.is_lo() || g.is_lo() {
                    return NodeId::LO;
                }
                if f.is_hi() {
                    return g;
                }
                if g.is_hi() {
                    return f;
                }
            }
            BoolOp::Or => {
                if f == g {
                    return f;
                }
                if f.is_hi() || g.is_hi() {
                    return NodeId::HI;
                }
                if f.is_lo() {
                    return g;
                }
                if g.is_lo() {
                    return f;
                }
            }
            BoolOp::Xor => {
                if f == g {
                    return NodeId::LO;
                }
                if f.is_lo() {
                    return g;
                }
                if g.is_lo() {
                    return f;
                }
                if f.is_hi() {
                    return self.apply_not(g);
                }
                if g.is_hi() {
                    return self.apply_not(f);
                }
            }
            BoolOp::Not => unreachable!("NOT is unary"),
        }

        let key = BddOpKey::commutative(op, f, g);
        if let Some(res) = self.cache.borrow().get(&key) {
            return res;
        }

        let f_node = self.node_at(f);
        let g_node = self.node_at(g);
        let f_level = self.level(&f_node);
        let g_level = self.level(&g_node);

        // Top-variable rule: split on the operand whose variable sits
        // higher in the ordering, in lockstep when tied.
        let res = match f_level.cmp(&g_level) {
            CmpOrdering::Less => {
                let lo = self.apply_binary(op, f_node.lo, g);
                let hi = self.apply_binary(op, f_node.hi, g);
                self.mk_node(f_node.var, lo, hi)
            }
            CmpOrdering::Greater => {
                let lo = self.apply_binary(op, f, g_node.lo);
                let hi = self.apply_binary(op, f, g_node.hi);
                self.mk_node(g_node.var, lo, hi)
            }
            CmpOrdering::Equal => {
                let lo = self.apply_binary(op, f_node.lo, g_node.lo);
                let hi = self.apply_binary(op, f_node.hi, g_node.hi);
                self.mk_node(f_node.var, lo, hi)
            }
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    // ========================================================================
    // Counting
    // ========================================================================

    /// The number of satisfying assignments over all `N` variables.
    ///
    /// Counts are 64-bit; factories with 64 or more variables must use
    /// [`sat_count_big`](Self::sat_count_big) instead.
    pub fn sat_count(&self, f: BddRef) -> Result<u64> {
        let node = self.check(f)?;
        let n = self.num_vars() as u32;
        if n >= 64 {
            return Err(DdError::unsupported(
                "sat_count overflows u64 with 64 or more variables; use sat_count_big",
            ));
        }
        if node.is_lo() {
            return Ok(0);
        }
        if node.is_hi() {
            return Ok(1u64 << n);
        }
        // Variables skipped above the root each double the count.
        let root_level = self.level(&self.node_at(node));
        Ok(self.count_rec(node) << root_level.raw())
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
        let level = self.level(&node).raw();
        let sub_lo = self.count_rec(node.lo);
        let sub_hi = self.count_rec(node.hi);
        // Each ordering position skipped between this node and a child is a
        // don't-care variable contributing a factor of 2 on that edge.
        let res = (sub_lo << self.skipped_levels(level, node.lo)) + (sub_hi << self.skipped_levels(level, node.hi));

        self.count_cache.borrow_mut().insert(f, res);
        res
    }

    fn skipped_levels(&self, level: u32, child: NodeId) -> u32 {
        let child_level = if child.is_terminal() {
            self.num_vars() as u32
        } else {
            self.level(&self.node_at(child)).raw()
        };
        child_level - level - 1
    }

    /// Arbitrary-precision satisfying-assignment count. Exact for any
    /// number of variables.
    pub fn sat_count_big(&self, f: BddRef) -> Result<BigUint> {
        let node = self.check(f)?;
        let n = self.num_vars() as u32;
        if node.is_lo() {
            return Ok(BigUint::zero());
        }
        if node.is_hi() {
            return Ok(BigUint::one() << n);
        }
        let mut cache = HashMap::new();
        let root_level = self.level(&self.node_at(node));
        Ok(self.count_big_rec(node, &mut cache) << root_level.raw())
    }

    fn count_big_rec(&self, f: NodeId, cache: &mut HashMap<NodeId, BigUint>) -> BigUint {
        if f.is_lo() {
            return BigUint::zero();
        }
        if f.is_hi() {
            return BigUint::one();
        }

        if let Some(cached) = cache.get(&f) {
            return cached.clone();
        }

        let node = self.node_at(f);
        let level = self.level(&node).raw();
        let sub_lo = self.count_big_rec(node.lo, cache);
        let sub_hi = self.count_big_rec(node.hi, cache);
        let res = (sub_lo << self.skipped_levels(level, node.lo)) + (sub_hi << self.skipped_levels(level, node.hi));

        cache.insert(f, res.clone());
        res
    }

    // ========================================================================
    // Stringification and reclamation
    // ========================================================================

    /// Structural rendering: `var(lo,hi)` with `LO`/`HI` at the leaves.
    pub fn to_bracket_string(&self, f: BddRef) -> Result<String> {
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
    pub fn collect_garbage(&self, roots: &[BddRef]) -> Result<usize> {
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

impl fmt::Debug for BddManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BddManager")
            .field("num_vars", &self.num_vars())
            .field("live_nodes", &self.size())
            .finish()
    }
}
