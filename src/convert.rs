//! Cross-variant conversion between BDDs and ZDDs.
//!
//! These conversions are correctness-first, not performance-first: the
//! source diagram is enumerated and the target rebuilt from the explicit
//! assignments / member sets. They exist as the reference against which any
//! optimised direct construction can be checked, and they make the
//! cross-variant round-trip properties testable.

use log::debug;

use crate::bdd::{BddManager, BddRef};
use crate::error::{DdError, Result};
use crate::zdd::{ZddManager, ZddRef};

fn check_same_ordering(bdd: &BddManager, zdd: &ZddManager) -> Result<()> {
    if bdd.ordering() != zdd.ordering() {
        return Err(DdError::unsupported(
            "Cross-variant conversion requires factories with identical orderings",
        ));
    }
    Ok(())
}

impl BddManager {
    /// Rebuilds the Boolean function `f` as the family of its satisfying
    /// assignments in the target ZDD factory.
    ///
    /// The factories must share one variable ordering. The enumeration can
    /// visit up to `2^N` assignments.
    pub fn to_zdd(&self, f: BddRef, target: &ZddManager) -> Result<ZddRef> {
        self.check(f)?;
        check_same_ordering(self, target)?;

        let mut sets: Vec<Vec<u32>> = Vec::new();
        let mut walker = self.sat_walker(f)?;
        while let Some(assignment) = walker.advance() {
            sets.push(
                assignment
                    .iter()
                    .enumerate()
                    .filter(|&(_, &value)| value)
                    .map(|(var, _)| var as u32)
                    .collect(),
            );
        }

        debug!("to_zdd: rebuilding from {} assignments", sets.len());
        target.family(&sets)
    }
}

impl ZddManager {
    /// Rebuilds the family `f` as the Boolean function satisfied exactly by
    /// its member sets, in the target BDD factory.
    ///
    /// The factories must share one variable ordering.
    pub fn to_bdd(&self, f: ZddRef, target: &BddManager) -> Result<BddRef> {
        self.check(f)?;
        check_same_ordering(target, self)?;

        let mut result = target.lo();
        let mut count = 0u64;
        let mut walker = self.member_walker(f)?;
        while let Some(member) = walker.advance() {
            let cube = target.assignment(member)?;
            result = target.or(result, cube)?;
            count += 1;
        }

        debug!("to_bdd: rebuilt from {} member sets", count);
        Ok(result)
    }
}
