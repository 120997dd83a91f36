//! Newtypes for iteration/test identification.

use core::fmt;

/// Dense index into the `[0, total_iters)` iteration space of one `Config`.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct IterIndex(pub u64);

impl fmt::Display for IterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for IterIndex {
    fn from(v: u64) -> Self {
        IterIndex(v)
    }
}

/// Test identification number: an iteration's offset within its enclosing
/// config, surfaced to logs (glossary: TIN).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Tin(pub u64);

impl fmt::Display for Tin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for one in-flight script execution, used by the
/// verdicts listener to attach out-of-band strings to the right running
/// test.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ExecId(pub u64);

impl fmt::Display for ExecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec:{}", self.0)
    }
}

/// Opaque arena index into a `RunItemArena`. Non-owning, resolved only
/// against the arena it was produced from.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct RunItemId(pub u32);

impl fmt::Display for RunItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Opaque arena index into a `Config`'s list of declared `Type`s.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TypeId(pub u32);
