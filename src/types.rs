//! Type-safe wrappers for variables, ordering levels, and node references.
//!
//! These newtypes enforce a compile-time distinction between variable IDs,
//! positions in the variable ordering, and indices into the node arena.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A decision variable (0-indexed).
///
/// Variables name the decision points of a diagram: for BDDs they are the
/// propositional variables, for ZDDs the elements of the universe.
///
/// # Invariants
///
/// - Valid variables are `0..N` where `N` is the factory's variable count
/// - [`Var::NONE`] is the sentinel carried by terminal nodes
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Sentinel for terminal nodes, which decide on no variable.
    pub const NONE: Var = Var(u32::MAX);

    /// Creates a new variable with the given ID.
    pub const fn new(id: u32) -> Self {
        Var(id)
    }

    /// Returns the raw variable ID.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Returns true if this is the terminal sentinel.
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<u32> for Var {
    fn from(id: u32) -> Self {
        Var::new(id)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A position in the variable ordering (0 = top of the diagram).
///
/// Terminals compare as [`Level::TERMINAL`], which is greater than every
/// real level, so the top-variable rule needs no special casing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(u32);

impl Level {
    /// The pseudo-level of terminal nodes (below every real level).
    pub const TERMINAL: Level = Level(u32::MAX);

    /// Creates a new level.
    pub const fn new(index: u32) -> Self {
        Level(index)
    }

    /// Returns the raw level value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the level as `usize` for indexing.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true if this is the terminal pseudo-level.
    pub const fn is_terminal(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "L-term")
        } else {
            write!(f, "L{}", self.0)
        }
    }
}

/// A node identifier (index into the node arena).
///
/// # Invariants
///
/// - `NodeId::LO` (index 0) is the LO terminal
/// - `NodeId::HI` (index 1) is the HI terminal
/// - Inner nodes start at index 2
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The LO terminal: "false" for BDDs, the empty family for ZDDs.
    pub const LO: NodeId = NodeId(0);

    /// The HI terminal: "true" for BDDs, the `{∅}` family for ZDDs.
    pub const HI: NodeId = NodeId(1);

    /// Sentinel for "no node" (end of a collision chain).
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Creates a NodeId from a raw index.
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    /// Returns the raw value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the index as `usize` for array access.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true if this is a terminal node.
    pub const fn is_terminal(self) -> bool {
        self.0 <= 1
    }

    /// Returns true if this is the LO terminal.
    pub const fn is_lo(self) -> bool {
        self.0 == 0
    }

    /// Returns true if this is the HI terminal.
    pub const fn is_hi(self) -> bool {
        self.0 == 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "LO"),
            1 => write!(f, "HI"),
            _ => write!(f, "@{}", self.0),
        }
    }
}

/// The identity of one factory.
///
/// Every manager draws a fresh id from a process-wide counter; handles carry
/// it so that mixing handles across factories is a single equality check.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ManagerId(u64);

impl ManagerId {
    /// Draws a fresh, process-unique id.
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ManagerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var() {
        let v0 = Var::new(0);
        let v1 = Var::new(1);
        assert_eq!(v0.id(), 0);
        assert!(v0 < v1);
        assert!(!v0.is_none());
        assert!(Var::NONE.is_none());
    }

    #[test]
    fn test_level_ordering() {
        let top = Level::new(0);
        let below = Level::new(5);
        assert!(top < below);
        assert!(below < Level::TERMINAL);
        assert!(Level::TERMINAL.is_terminal());
    }

    #[test]
    fn test_node_id_terminals() {
        assert!(NodeId::LO.is_terminal());
        assert!(NodeId::HI.is_terminal());
        assert!(NodeId::LO.is_lo());
        assert!(NodeId::HI.is_hi());
        assert!(!NodeId::new(2).is_terminal());
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::LO), "LO");
        assert_eq!(format!("{}", NodeId::HI), "HI");
        assert_eq!(format!("{}", NodeId::new(42)), "@42");
    }

    #[test]
    fn test_manager_ids_are_unique() {
        let a = ManagerId::fresh();
        let b = ManagerId::fresh();
        assert_ne!(a, b);
    }
}
