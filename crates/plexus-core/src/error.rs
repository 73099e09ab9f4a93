//! Error types raised at the unit level.
//!
//! Controllers and services report failure by returning [`ExecuteError`].
//! The engine wraps it with the failing unit's identity and cycle number;
//! it never swallows or retries it.

use crate::value::ValueKind;

/// A port value did not have the type a unit expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// Typed extraction found a different variant.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// The kind the caller asked for.
        expected: ValueKind,
        /// The kind actually stored.
        found: ValueKind,
    },
}

/// A port name appeared more than once in a single port set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("duplicate port '{port}'")]
pub struct DuplicatePort {
    /// The repeated port name.
    pub port: String,
}

/// Failure reported by a [`Controller`](crate::Controller) or
/// [`Service`](crate::Service).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    /// The unit looked up a port that does not exist.
    #[error("port '{port}' not found")]
    MissingPort {
        /// Name of the missing port.
        port: String,
    },
    /// The unit looked up a client that does not exist.
    #[error("client '{client}' not found")]
    MissingClient {
        /// Name of the missing client.
        client: String,
    },
    /// A port held a value of the wrong type.
    #[error(transparent)]
    Value(#[from] ValueError),
    /// Free-form failure raised by unit logic.
    #[error("execution failed: {reason}")]
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl ExecuteError {
    /// Shorthand for [`ExecuteError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}
