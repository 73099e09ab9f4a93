//! Engine-owned run state: the cycle counter and free-form user data.

use plexus_core::{CycleContext, CycleId, UserData};

/// Shared per-run context.
///
/// `cycle` equals the number of cycles completed since the engine was
/// built. Only the engine advances it; units see it read-only through
/// [`CycleContext`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    cycle: CycleId,
    user: UserData,
}

impl State {
    /// Fresh state at cycle 0 holding `user`.
    pub fn new(user: UserData) -> Self {
        Self {
            cycle: CycleId(0),
            user,
        }
    }

    /// Number of completed cycles.
    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    /// Shared user data.
    pub fn user(&self) -> &UserData {
        &self.user
    }

    /// Mutable shared user data.
    pub fn user_mut(&mut self) -> &mut UserData {
        &mut self.user
    }

    pub(crate) fn context(&mut self) -> CycleContext<'_> {
        CycleContext::new(self.cycle, &mut self.user)
    }

    pub(crate) fn advance(&mut self) {
        self.cycle = self.cycle.next();
    }
}
