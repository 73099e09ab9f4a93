//! Table-driven port values for a single client.

use indexmap::IndexMap;
use plexus_core::{Controller, CycleContext, ExecuteError, PortsMut};

use crate::series::TimeSeries;

/// Sets its client's ports from per-port [`TimeSeries`] each cycle.
///
/// Each configured port receives `series.get(cycle)`. Ports without a
/// series are left untouched. A series naming a port the client does not
/// have fails the cycle with [`ExecuteError::MissingPort`].
///
/// Runs in the controller phase, so values written in cycle `c` reach
/// connected ports during propagation of cycle `c + 1`.
#[derive(Clone, Debug, Default)]
pub struct LookupTable {
    series: IndexMap<String, TimeSeries>,
}

impl LookupTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the series for `port`.
    pub fn with_series(mut self, port: impl Into<String>, series: TimeSeries) -> Self {
        self.insert(port, series);
        self
    }

    /// Add or replace the series for `port`, returning the previous one.
    pub fn insert(&mut self, port: impl Into<String>, series: TimeSeries) -> Option<TimeSeries> {
        self.series.insert(port.into(), series)
    }

    /// The series driving `port`.
    pub fn series(&self, port: &str) -> Option<&TimeSeries> {
        self.series.get(port)
    }
}

impl<S: Into<String>> FromIterator<(S, TimeSeries)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (S, TimeSeries)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Controller for LookupTable {
    fn execute(&mut self, mut ports: PortsMut<'_>, ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        for (port, series) in &self.series {
            ports.set(port, series.get(ctx.cycle()).clone())?;
        }
        Ok(())
    }
}
