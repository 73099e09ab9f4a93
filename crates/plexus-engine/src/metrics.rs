//! Per-cycle timing metrics.
//!
//! [`CycleMetrics`] captures wall-clock timing for a single cycle. The
//! engine replaces it after every successful
//! [`next_cycle()`](crate::Engine::next_cycle).

use plexus_core::CycleId;

/// Timing collected during a single cycle. Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleMetrics {
    /// The cycle these metrics describe.
    pub cycle: CycleId,
    /// Wall-clock time for the entire cycle.
    pub total_us: u64,
    /// Per-service execution times in execution order: `(name, microseconds)`.
    pub service_us: Vec<(String, u64)>,
    /// Time spent copying values along connections.
    pub propagation_us: u64,
    /// Time spent running all controllers.
    pub controller_us: u64,
    /// Number of connections propagated.
    pub connections: usize,
}

impl CycleMetrics {
    /// Sum of all service timings.
    pub fn services_total_us(&self) -> u64 {
        self.service_us.iter().map(|(_, us)| us).sum()
    }
}
