//! The variable ordering of one factory.
//!
//! An ordering is a permutation of `{0, .., N-1}` fixed at factory
//! construction. The factory keeps the two inverse arrays: variable to
//! ordering index (`v2i`) and ordering index to variable (`i2v`). The top of
//! the diagram uses the variable whose ordering index is smallest.

use crate::error::{DdError, Result};
use crate::types::{Level, Var};

/// Validated variable-ordering tables.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VarOrdering {
    /// Maps from variables to ordering indices.
    v2i: Vec<u32>,
    /// Maps from ordering indices to variables.
    i2v: Vec<u32>,
}

impl VarOrdering {
    /// Builds the tables from the given permutation.
    ///
    /// The ordering must contain each of `0..ordering.len()` exactly once
    /// and must not be empty.
    pub fn new(ordering: &[u32]) -> Result<Self> {
        if ordering.is_empty() {
            return Err(DdError::invalid_argument("Variable ordering must not be empty"));
        }

        let n = ordering.len();
        let mut counts = vec![0u32; n];
        for &v in ordering {
            if (v as usize) >= n {
                return Err(DdError::invalid_argument(format!(
                    "Variables in ordering must be 0 to {}. Got {}",
                    n - 1,
                    v
                )));
            }
            counts[v as usize] += 1;
            if counts[v as usize] > 1 {
                return Err(DdError::invalid_argument(format!(
                    "Same variable {} appeared multiple times in variable ordering",
                    v
                )));
            }
        }

        let mut v2i = vec![0u32; n];
        let mut i2v = vec![0u32; n];
        for (i, &v) in ordering.iter().enumerate() {
            i2v[i] = v;
            v2i[v as usize] = i as u32;
        }

        Ok(Self { v2i, i2v })
    }

    /// The number of variables.
    pub fn num_vars(&self) -> usize {
        self.i2v.len()
    }

    /// Returns true if `var` names a variable of this factory.
    pub fn in_range(&self, var: u32) -> bool {
        (var as usize) < self.i2v.len()
    }

    /// The ordering index of a variable. Terminals map to
    /// [`Level::TERMINAL`].
    pub fn level_of(&self, var: Var) -> Level {
        if var.is_none() {
            Level::TERMINAL
        } else {
            Level::new(self.v2i[var.id() as usize])
        }
    }

    /// The variable at a given ordering index.
    pub fn var_at(&self, level: Level) -> Var {
        Var::new(self.i2v[level.index()])
    }

    /// The ordering permutation as originally supplied.
    pub fn as_permutation(&self) -> Vec<u32> {
        self.i2v.clone()
    }
}
