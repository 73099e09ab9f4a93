//! Cycle engine and periodic driver for Plexus simulations.
//!
//! [`Engine`] owns the topology and executes one cycle per
//! [`next_cycle()`](Engine::next_cycle) call: services, then connection
//! propagation, then controllers. [`RealtimeEngine`] moves an engine onto
//! a background thread and drives it at a fixed period until stopped.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod realtime;
pub mod state;
mod worker;

pub use config::{ConfigError, MissedCycles, RealtimeConfig, DEFAULT_THREAD_NAME};
pub use engine::Engine;
pub use error::{CycleError, EndpointFault, RealtimeError, RegistrationError};
pub use metrics::CycleMetrics;
pub use realtime::{RealtimeEngine, RealtimePhase, RunReport};
pub use state::State;
