//! Minimal error set for core-domain validation, numbering, and evaluation.

use core::fmt;

/// Errors raised by `tester_core` itself (tree shape, numbering, scenario
/// algebra, requirement parsing).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoreError {
    /// A `RunItem` or `Config` numbering field would overflow the
    /// platform's unsigned limit.
    Overflow { item: String },
    /// A requirement expression referenced an argument name that isn't
    /// declared on the current run item (`ref=arg-name` indirection).
    UnknownArgRef { name: String },
    /// Two scenario acts passed to `merge` intersect; treated as a
    /// reported precondition violation rather than a panic.
    OverlappingActs { first: u64, last: u64 },
    /// Act range is malformed (`first > last`) or out of bounds.
    InvalidAct { first: u64, last: u64 },
    /// Internal invariant violated; should not occur in correct code.
    Internal(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Overflow { item } => write!(f, "iteration count overflow at {item}"),
            CoreError::UnknownArgRef { name } => write!(f, "unknown argument reference '{name}'"),
            CoreError::OverlappingActs { first, last } => {
                write!(f, "overlapping scenario acts at [{first}, {last}]")
            }
            CoreError::InvalidAct { first, last } => {
                write!(f, "invalid act range [{first}, {last}]")
            }
            CoreError::Internal(m) => write!(f, "internal error: {m}"),
        }
    }
}

impl std::error::Error for CoreError {}
