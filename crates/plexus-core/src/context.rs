//! Per-cycle execution context handed to controllers and services.

use indexmap::IndexMap;

use crate::id::CycleId;
use crate::value::Value;

/// Free-form user state shared by every unit for the lifetime of one engine.
pub type UserData = IndexMap<String, Value>;

/// Context passed to each unit's `execute()`.
///
/// The cycle number is read-only: only the engine advances it. User data
/// is mutable and persists across cycles.
#[derive(Debug)]
pub struct CycleContext<'a> {
    cycle: CycleId,
    user: &'a mut UserData,
}

impl<'a> CycleContext<'a> {
    /// Construct a context.
    ///
    /// Typically called by the engine, not by units directly.
    pub fn new(cycle: CycleId, user: &'a mut UserData) -> Self {
        Self { cycle, user }
    }

    /// The cycle being executed. Equals the number of cycles completed
    /// before this one.
    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    /// Shared user data.
    pub fn user(&self) -> &UserData {
        &*self.user
    }

    /// Mutable shared user data.
    pub fn user_mut(&mut self) -> &mut UserData {
        self.user
    }
}
