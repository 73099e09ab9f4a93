//! Whole-topology value recording.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use plexus_core::{ClientsMut, Connection, CycleContext, ExecuteError, Service, Value};

type PortSeries = IndexMap<String, Vec<Value>>;

/// Shared record of every port value, keyed by client then port.
#[derive(Clone, Debug, Default)]
pub struct TopologyHistory {
    inner: Arc<Mutex<IndexMap<String, PortSeries>>>,
}

impl TopologyHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded values of `client.port`, oldest first.
    pub fn port(&self, client: &str, port: &str) -> Option<Vec<Value>> {
        self.lock().get(client)?.get(port).cloned()
    }

    /// Recorded values of every port of `client`.
    pub fn client(&self, client: &str) -> Option<PortSeries> {
        self.lock().get(client).cloned()
    }

    /// Copy of the whole history.
    pub fn snapshot(&self) -> IndexMap<String, PortSeries> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, PortSeries>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Service recording every port of every client once per cycle.
///
/// Runs in the service phase, so it records values as they stood before
/// this cycle's propagation. Register it at a low priority to see the
/// writes of other services.
#[derive(Clone, Debug, Default)]
pub struct TopologyRecorder {
    history: TopologyHistory,
}

impl TopologyRecorder {
    /// A recorder with a fresh history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the recorded data.
    pub fn history(&self) -> TopologyHistory {
        self.history.clone()
    }
}

impl Service for TopologyRecorder {
    fn name(&self) -> &str {
        "topology-recorder"
    }

    fn execute(
        &mut self,
        clients: ClientsMut<'_>,
        _connections: &[Connection],
        _ctx: &mut CycleContext<'_>,
    ) -> Result<(), ExecuteError> {
        let mut data = self.history.lock();
        for client in clients.iter() {
            let ports = data.entry(client.name().to_string()).or_default();
            for port in client.ports().iter() {
                ports
                    .entry(port.name().to_string())
                    .or_default()
                    .push(port.value().clone());
            }
        }
        Ok(())
    }
}
