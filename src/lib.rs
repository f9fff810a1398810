//! # dd-rs: Binary and Zero-Suppressed Decision Diagrams in Rust
//!
//! **`dd-rs`** is a manager-centric library for two canonical decision
//! diagram variants sharing one infrastructure: classical **Reduced Ordered
//! Binary Decision Diagrams (BDDs)**, representing Boolean functions over a
//! fixed variable ordering, and **Zero-suppressed Decision Diagrams
//! (ZDDs)**, representing families of subsets over a fixed universe.
//!
//! ## What is a decision diagram?
//!
//! Both variants are maximally-reduced, maximally-shared directed acyclic
//! graphs. For a fixed variable ordering every Boolean function (BDD) and
//! every set family (ZDD) has exactly one representation, so checking
//! equivalence is a single handle comparison.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: all operations go through a
//!   [`BddManager`][crate::bdd::BddManager] or
//!   [`ZddManager`][crate::zdd::ZddManager]. This ensures structural
//!   sharing (hash consing) and maintains the canonical-form invariant.
//! - **Pure operations**: operators never mutate their operands; they
//!   return new lightweight handles onto the shared graph.
//! - **Operation caching**: a bounded computed table avoids redundant
//!   recursion, and never extends a node's lifetime.
//! - **Explicit reclamation**: `collect_garbage` sweeps every node
//!   unreachable from the handles you keep.
//!
//! ## Basic Usage
//!
//! ```rust
//! use dd_rs::bdd::BddManager;
//!
//! // A factory with 3 variables in natural order and a 1024-slot cache.
//! let mgr = BddManager::new(&[0, 1, 2], 1 << 10)?;
//!
//! // f = x0 AND NOT x1
//! let x0 = mgr.hi_var(0)?;
//! let not_x1 = mgr.lo_var(1)?;
//! let f = mgr.and(x0, not_x1)?;
//!
//! assert_eq!(mgr.sat_count(f)?, 2); // x2 is a don't-care
//! for assignment in mgr.sat_assignments(f)? {
//!     println!("{:?}", assignment);
//! }
//! # Ok::<(), dd_rs::error::DdError>(())
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: the BDD factory and Boolean operators.
//! - **[`zdd`]**: the ZDD factory, set-family operators, and constructors.
//! - **[`pool`]**: a typed set-of-T façade backed by a shared ZDD factory.
//! - **[`iter`]**: satisfying-assignment and member-set enumeration.
//! - **[`convert`]**: cross-variant conversion (enumerate and rebuild).
//! - **[`dot`]**: Graphviz export.

pub mod bdd;
pub mod bitset;
pub mod cache;
pub mod convert;
pub mod dot;
pub mod error;
pub mod iter;
pub mod node;
pub mod ordering;
pub mod pool;
pub mod store;
pub mod subtable;
pub mod types;
pub mod utils;
pub mod zdd;
