//! Strongly-typed cycle identifier.

use std::fmt;

/// Monotonically increasing cycle counter.
///
/// `CycleId(n)` is both the index of the cycle currently executing and the
/// number of cycles completed before it. The engine starts at `CycleId(0)`
/// and advances by one after each completed cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleId(pub u64);

impl CycleId {
    /// The cycle that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CycleId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
