//! Iteration over satisfying assignments and family members.
//!
//! Enumeration is a depth-first walk with an explicit stack. The primary
//! interface is a *walker* whose `advance` method lends one reused
//! length-`N` buffer per step; callers must copy the slice if they keep
//! it. [`SatAssignments`] and [`Members`] wrap the walkers into ordinary
//! `Iterator`s producing fresh vectors for safety-first callers.
//!
//! Both walkers descend the lo edge (variable false / element absent)
//! before the hi edge, and never traverse into the LO terminal. The BDD
//! walker additionally expands every variable skipped by reduction into an
//! explicit don't-care step, so each emitted vector has one entry per
//! variable and the number of emitted vectors equals the satisfying-
//! assignment count.

use crate::bdd::{BddManager, BddRef};
use crate::error::Result;
use crate::types::{Level, NodeId};
use crate::zdd::{ZddManager, ZddRef};

/// DFS visit state of one stack frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Branch {
    /// About to descend the lo edge.
    TryLo,
    /// Lo explored; about to descend the hi edge.
    TryHi,
    /// Both edges explored; backtrack.
    Done,
}

/// Stack frame of the BDD walker: one frame per ordering level.
#[derive(Debug)]
struct LevelFrame {
    node: NodeId,
    /// Ordering level this frame decides.
    level: u32,
    state: Branch,
}

/// Stack frame of the ZDD walker: one frame per diagram node.
#[derive(Debug)]
struct NodeFrame {
    node: NodeId,
    state: Branch,
}

// ============================================================================
// BDD: satisfying assignments
// ============================================================================

/// Streaming enumeration of the satisfying assignments of a BDD.
///
/// `advance` yields each assignment as a `&[bool]` indexed by variable.
/// The returned slice aliases an internal buffer that the next call
/// overwrites.
pub struct SatWalker<'a> {
    mgr: &'a BddManager,
    stack: Vec<LevelFrame>,
    buf: Vec<bool>,
}

impl<'a> SatWalker<'a> {
    pub(crate) fn new(mgr: &'a BddManager, root: NodeId) -> Self {
        let num_vars = mgr.num_vars();
        let mut stack = Vec::new();
        if !root.is_lo() {
            stack.push(LevelFrame {
                node: root,
                level: 0,
                state: Branch::TryLo,
            });
        }
        Self {
            mgr,
            stack,
            buf: vec![false; num_vars],
        }
    }

    /// Produces the next satisfying assignment, or `None` when exhausted.
    pub fn advance(&mut self) -> Option<&[bool]> {
        let num_vars = self.mgr.num_vars() as u32;
        loop {
            let frame = self.stack.last_mut()?;

            // A frame below the last level holds a terminal; LO is pruned
            // at push time, so reaching here means one full assignment.
            if frame.level == num_vars {
                debug_assert!(frame.node.is_hi());
                self.stack.pop();
                return Some(&self.buf);
            }

            let ordering = self.mgr.ordering_ref();
            let var = ordering.var_at(Level::new(frame.level));
            let node = frame.node;
            // A node whose variable sits deeper than this frame's level is
            // a don't-care at this level: both branches continue with the
            // same node.
            let decides_here = !node.is_terminal() && self.mgr.node_at(node).var == var;

            match frame.state {
                Branch::TryLo => {
                    frame.state = Branch::TryHi;
                    let level = frame.level;
                    self.buf[var.id() as usize] = false;
                    let child = if decides_here { self.mgr.node_at(node).lo } else { node };
                    if !child.is_lo() {
                        self.stack.push(LevelFrame {
                            node: child,
                            level: level + 1,
                            state: Branch::TryLo,
                        });
                    }
                }
                Branch::TryHi => {
                    frame.state = Branch::Done;
                    let level = frame.level;
                    self.buf[var.id() as usize] = true;
                    let child = if decides_here { self.mgr.node_at(node).hi } else { node };
                    if !child.is_lo() {
                        self.stack.push(LevelFrame {
                            node: child,
                            level: level + 1,
                            state: Branch::TryLo,
                        });
                    }
                }
                Branch::Done => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Iterator over satisfying assignments, producing a fresh vector per item.
pub struct SatAssignments<'a> {
    walker: SatWalker<'a>,
}

impl Iterator for SatAssignments<'_> {
    type Item = Vec<bool>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.advance().map(<[bool]>::to_vec)
    }
}

impl BddManager {
    /// Streaming enumeration of satisfying assignments. The yielded slice
    /// is reused between steps; copy it to retain it.
    pub fn sat_walker(&self, f: BddRef) -> Result<SatWalker<'_>> {
        let node = self.check(f)?;
        Ok(SatWalker::new(self, node))
    }

    /// Iterator over satisfying assignments, one fresh `Vec<bool>` per
    /// assignment.
    pub fn sat_assignments(&self, f: BddRef) -> Result<SatAssignments<'_>> {
        Ok(SatAssignments {
            walker: self.sat_walker(f)?,
        })
    }

    /// The first satisfying assignment in enumeration order, if any.
    pub fn one_sat(&self, f: BddRef) -> Result<Option<Vec<bool>>> {
        let mut walker = self.sat_walker(f)?;
        Ok(walker.advance().map(<[bool]>::to_vec))
    }
}

// ============================================================================
// ZDD: family members
// ============================================================================

/// Streaming enumeration of the member sets of a ZDD family.
///
/// Each member is yielded as a `&[bool]` indexed by variable, true where
/// the element belongs to the set. A variable elided by zero-suppression
/// is absent (false), never a don't-care. The returned slice aliases an
/// internal buffer that the next call overwrites.
pub struct MemberWalker<'a> {
    mgr: &'a ZddManager,
    stack: Vec<NodeFrame>,
    buf: Vec<bool>,
}

impl<'a> MemberWalker<'a> {
    pub(crate) fn new(mgr: &'a ZddManager, root: NodeId) -> Self {
        let num_vars = mgr.num_vars();
        let mut stack = Vec::new();
        if !root.is_lo() {
            stack.push(NodeFrame {
                node: root,
                state: Branch::TryLo,
            });
        }
        Self {
            mgr,
            stack,
            buf: vec![false; num_vars],
        }
    }

    /// Produces the next member set, or `None` when exhausted.
    pub fn advance(&mut self) -> Option<&[bool]> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;

            if node.is_hi() {
                self.stack.pop();
                return Some(&self.buf);
            }

            let data = self.mgr.node_at(node);
            let var = data.var.id() as usize;
            match frame.state {
                Branch::TryLo => {
                    frame.state = Branch::TryHi;
                    if !data.lo.is_lo() {
                        self.stack.push(NodeFrame {
                            node: data.lo,
                            state: Branch::TryLo,
                        });
                    }
                }
                Branch::TryHi => {
                    frame.state = Branch::Done;
                    self.buf[var] = true;
                    // hi is never LO by zero-suppression.
                    self.stack.push(NodeFrame {
                        node: data.hi,
                        state: Branch::TryLo,
                    });
                }
                Branch::Done => {
                    self.buf[var] = false;
                    self.stack.pop();
                }
            }
        }
    }
}

/// Iterator over family members, producing a fresh vector per item.
pub struct Members<'a> {
    walker: MemberWalker<'a>,
}

impl Iterator for Members<'_> {
    type Item = Vec<bool>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.advance().map(<[bool]>::to_vec)
    }
}

/// Iterator over the variables along a single-path ZDD.
///
/// For a diagram that is one chain from the root to HI (the shape the set
/// pool maintains), this yields the chain's variables in ordering order.
pub struct Elements<'a> {
    mgr: &'a ZddManager,
    cur: NodeId,
}

impl Iterator for Elements<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur.is_terminal() {
            return None;
        }
        let node = self.mgr.node_at(self.cur);
        self.cur = node.lo;
        Some(node.var.id())
    }
}

impl ZddManager {
    /// Streaming enumeration of the family's member sets. The yielded
    /// slice is reused between steps; copy it to retain it.
    pub fn member_walker(&self, f: ZddRef) -> Result<MemberWalker<'_>> {
        let node = self.check(f)?;
        Ok(MemberWalker::new(self, node))
    }

    /// Iterator over the family's member sets, one fresh `Vec<bool>` per
    /// member.
    pub fn members(&self, f: ZddRef) -> Result<Members<'_>> {
        Ok(Members {
            walker: self.member_walker(f)?,
        })
    }

    /// Iterator over the variables along a single-path diagram.
    pub fn elements(&self, f: ZddRef) -> Result<Elements<'_>> {
        let node = self.check(f)?;
        Ok(Elements { mgr: self, cur: node })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd::BddManager;
    use crate::zdd::ZddManager;

    #[test]
    fn test_sat_walker_constants() {
        let mgr = BddManager::new(&[0, 1], 64).unwrap();

        let mut lo = mgr.sat_walker(mgr.lo()).unwrap();
        assert!(lo.advance().is_none());

        // HI enumerates the full cube.
        let all: Vec<_> = mgr.sat_assignments(mgr.hi()).unwrap().collect();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_sat_walker_expands_dont_cares() {
        let mgr = BddManager::new(&[0, 1, 2], 64).unwrap();
        let x = mgr.hi_var(0).unwrap();

        let sats: Vec<_> = mgr.sat_assignments(x).unwrap().collect();
        assert_eq!(sats.len() as u64, mgr.sat_count(x).unwrap());
        for sat in &sats {
            assert_eq!(sat.len(), 3);
            assert!(sat[0]);
        }
        // Lo-first order: don't-cares run false before true.
        assert_eq!(sats[0], vec![true, false, false]);
        assert_eq!(sats[3], vec![true, true, true]);
    }

    #[test]
    fn test_sat_walker_buffer_is_reused() {
        let mgr = BddManager::new(&[0, 1], 64).unwrap();
        let x = mgr.hi_var(0).unwrap();
        let mut walker = mgr.sat_walker(x).unwrap();

        let first = walker.advance().unwrap().to_vec();
        let second = walker.advance().unwrap().to_vec();
        assert_ne!(first, second);
        assert!(walker.advance().is_none());
    }

    #[test]
    fn test_one_sat() {
        let mgr = BddManager::new(&[0, 1, 2], 64).unwrap();
        assert_eq!(mgr.one_sat(mgr.lo()).unwrap(), None);

        let f = mgr.assignment(&[false, true, false]).unwrap();
        assert_eq!(mgr.one_sat(f).unwrap(), Some(vec![false, true, false]));
    }

    #[test]
    fn test_member_walker() {
        let mgr = ZddManager::new(&[0, 1, 2], 64).unwrap();
        let fam = mgr.family(&[vec![0], vec![1, 2]]).unwrap();

        let members: Vec<_> = mgr.members(fam).unwrap().collect();
        assert_eq!(members.len() as u64, mgr.count(fam).unwrap());
        assert!(members.contains(&vec![true, false, false]));
        assert!(members.contains(&vec![false, true, true]));
    }

    #[test]
    fn test_member_walker_terminals() {
        let mgr = ZddManager::new(&[0, 1], 64).unwrap();

        let none: Vec<_> = mgr.members(mgr.empty()).unwrap().collect();
        assert!(none.is_empty());

        let base: Vec<_> = mgr.members(mgr.base()).unwrap().collect();
        assert_eq!(base, vec![vec![false, false]]);
    }

    #[test]
    fn test_member_walker_skipped_means_absent() {
        let mgr = ZddManager::new(&[0, 1, 2], 64).unwrap();
        let e = mgr.element(1).unwrap();
        let members: Vec<_> = mgr.members(e).unwrap().collect();
        assert_eq!(members, vec![vec![false, true, false]]);
    }

    #[test]
    fn test_elements_single_path() {
        let mgr = ZddManager::new(&[0, 1, 2, 3], 64).unwrap();
        // {{0}, {2}, {3}} is a lo-chain of singleton nodes.
        let mut fam = mgr.element(3).unwrap();
        fam = mgr.union(fam, mgr.element(0).unwrap()).unwrap();
        fam = mgr.union(fam, mgr.element(2).unwrap()).unwrap();

        let vars: Vec<_> = mgr.elements(fam).unwrap().collect();
        assert_eq!(vars, vec![0, 2, 3]);
    }

    #[test]
    fn test_elements_of_terminals() {
        let mgr = ZddManager::new(&[0], 64).unwrap();
        assert_eq!(mgr.elements(mgr.empty()).unwrap().count(), 0);
        assert_eq!(mgr.elements(mgr.base()).unwrap().count(), 0);
    }
}
