//! Per-client value recording.
//!
//! [`Recorder`] appends every port value of its client once per cycle.
//! The data lives behind a shared [`History`] handle so it stays readable
//! after the recorder has been moved into an engine, including one owned
//! by a realtime worker thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use plexus_core::{Controller, CycleContext, ExecuteError, Ports, PortsMut, Value};

/// Shared, cloneable record of port values keyed by port name.
///
/// Entry `i` of a port's history is the value the port held when the
/// recorder ran for the `i`-th time.
#[derive(Clone, Debug, Default)]
pub struct History {
    inner: Arc<Mutex<IndexMap<String, Vec<Value>>>>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded values of `port`, oldest first.
    pub fn port(&self, port: &str) -> Option<Vec<Value>> {
        self.lock().get(port).cloned()
    }

    /// Copy of the whole history, ports in first-seen order.
    pub fn snapshot(&self) -> IndexMap<String, Vec<Value>> {
        self.lock().clone()
    }

    /// Number of values recorded for `port`.
    pub fn port_len(&self, port: &str) -> usize {
        self.lock().get(port).map_or(0, Vec::len)
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().values().all(Vec::is_empty)
    }

    /// Drop all recorded values.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn record(&self, ports: &Ports) {
        let mut data = self.lock();
        for port in ports.iter() {
            data.entry(port.name().to_string())
                .or_default()
                .push(port.value().clone());
        }
    }

    // A reader panicking while holding the lock leaves the data intact.
    fn lock(&self) -> MutexGuard<'_, IndexMap<String, Vec<Value>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Controller appending its client's port values to a [`History`].
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    history: History,
}

impl Recorder {
    /// A recorder with a fresh history.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder writing into an existing history.
    pub fn with_history(history: History) -> Self {
        Self { history }
    }

    /// Handle to the recorded data.
    pub fn history(&self) -> History {
        self.history.clone()
    }
}

impl Controller for Recorder {
    fn execute(&mut self, ports: PortsMut<'_>, _ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        self.history.record(&ports);
        Ok(())
    }
}
