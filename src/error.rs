//! Error type for diagram operations.
//!
//! Every failure surfaced by this crate is a [`DdError`]: a tagged kind plus
//! a descriptive message. All errors are synchronous and raised at the call
//! site; the engine itself is deterministic pure computation, so an error
//! always indicates a misuse of the API rather than a transient condition.

use std::error::Error;
use std::fmt;

/// The condition class of a [`DdError`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// A malformed input: variable out of range, malformed ordering,
    /// cross-factory handle, assignment length mismatch.
    InvalidArgument,
    /// The operation is not available for the given operands, e.g. a
    /// cross-variant conversion between factories with different orderings.
    UnsupportedOperation,
    /// A referenced element does not exist, e.g. a set-pool element outside
    /// the pool's domain.
    NoSuchElement,
    /// Iteration continued after the underlying handle was replaced.
    ConcurrentModification,
    /// Internal dispatch failure. Operator dispatch is an exhaustive match
    /// over closed enums, so this kind is unreachable through the safe API;
    /// it is declared to keep the taxonomy complete.
    UnknownOperator,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::UnsupportedOperation => "unsupported operation",
            ErrorKind::NoSuchElement => "no such element",
            ErrorKind::ConcurrentModification => "concurrent modification",
            ErrorKind::UnknownOperator => "unknown operator",
        };
        f.write_str(name)
    }
}

/// An error raised by a diagram factory, iterator, or the set pool.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DdError {
    kind: ErrorKind,
    message: String,
}

impl DdError {
    /// Creates an error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an [`ErrorKind::InvalidArgument`] error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Shorthand for an [`ErrorKind::UnsupportedOperation`] error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedOperation, message)
    }

    /// Shorthand for an [`ErrorKind::NoSuchElement`] error.
    pub fn no_such_element(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoSuchElement, message)
    }

    /// Shorthand for an [`ErrorKind::ConcurrentModification`] error.
    pub fn concurrent_modification(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConcurrentModification, message)
    }

    /// The condition class of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The descriptive message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for DdError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DdError>;
