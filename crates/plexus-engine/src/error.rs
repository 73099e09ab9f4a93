//! Error types for registration, cycle execution and the periodic driver.

use plexus_core::{CycleId, Endpoint, ExecuteError};

/// Which half of an [`Endpoint`] failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EndpointFault {
    /// No client with that name is registered.
    #[error("no such client")]
    NoSuchClient,
    /// The client exists but has no port with that name.
    #[error("no such port")]
    NoSuchPort,
}

/// Topology registration failed. Raised eagerly by the call that would
/// introduce the invalid state; the engine is left unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// A client with this name is already registered.
    #[error("client '{name}' is already registered")]
    DuplicateName {
        /// The repeated client name.
        name: String,
    },
    /// A client declared the same port name twice.
    #[error("client '{client}' declares port '{port}' more than once")]
    InvalidPortSet {
        /// The client being registered.
        client: String,
        /// The repeated port name.
        port: String,
    },
    /// A connection or port write referenced a client or port that does
    /// not exist.
    #[error("unknown endpoint {endpoint}: {fault}")]
    UnknownEndpoint {
        /// The endpoint as given by the caller.
        endpoint: Endpoint,
        /// Whether the client or the port was missing.
        fault: EndpointFault,
    },
    /// Cycles have started; the topology can no longer change.
    #[error("topology is frozen once cycles have started (at cycle {cycle})")]
    TopologyFrozen {
        /// The engine's cycle counter when the registration was attempted.
        cycle: CycleId,
    },
}

/// A unit failed during [`Engine::next_cycle()`](crate::Engine::next_cycle).
///
/// The cycle is aborted where it failed. Nothing is rolled back and the
/// cycle counter is not advanced.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    /// A service returned an error.
    #[error("service '{service}' failed in cycle {cycle}: {source}")]
    ServiceFailed {
        /// The service's [`name()`](plexus_core::Service::name).
        service: String,
        /// The cycle that was aborted.
        cycle: CycleId,
        /// The service's error.
        source: ExecuteError,
    },
    /// A client's controller returned an error.
    #[error("controller of client '{client}' failed in cycle {cycle}: {source}")]
    ControllerFailed {
        /// The client owning the controller.
        client: String,
        /// The cycle that was aborted.
        cycle: CycleId,
        /// The controller's error.
        source: ExecuteError,
    },
}

impl CycleError {
    /// The cycle that was aborted.
    pub fn cycle(&self) -> CycleId {
        match self {
            Self::ServiceFailed { cycle, .. } | Self::ControllerFailed { cycle, .. } => *cycle,
        }
    }

    /// The unit-level error.
    pub fn execute_error(&self) -> &ExecuteError {
        match self {
            Self::ServiceFailed { source, .. } | Self::ControllerFailed { source, .. } => source,
        }
    }
}

/// Lifecycle misuse or background failure of a
/// [`RealtimeEngine`](crate::RealtimeEngine).
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// `start()` while the worker is running or stopping.
    #[error("realtime engine is already running")]
    AlreadyRunning,
    /// `stop()` or `join()` with no worker to act on.
    #[error("realtime engine is not running")]
    NotRunning,
    /// `join()` before `stop()`; joining would block forever.
    #[error("join requested before stop")]
    StopNotRequested,
    /// A background cycle failed and the worker exited.
    #[error("background cycle failed: {0}")]
    Cycle(#[from] CycleError),
    /// A unit panicked on the worker thread. The engine is lost.
    #[error("cycle worker panicked: {message}")]
    WorkerPanicked {
        /// The panic payload, if it was a string.
        message: String,
    },
    /// The engine was lost to an earlier panic or spawn failure.
    #[error("engine is unavailable")]
    EngineUnavailable,
    /// The worker thread could not be spawned.
    #[error("failed to spawn cycle worker: {0}")]
    Spawn(#[source] std::io::Error),
}
