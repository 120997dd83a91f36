//! Errors from path matching and dial sampling.

use tester_core::CoreError;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum AlgoError {
    #[error("path segment '{name}' has no matching run item here")]
    UnknownPathSegment { name: String },

    #[error("iteration selector {index} on '{name}' is out of range (0..{bound})")]
    SelectorOutOfRange { name: String, index: u64, bound: u64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}
