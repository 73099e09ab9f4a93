//! Plexus: a discrete-cycle simulation engine for port-connected clients.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Plexus sub-crates. For most users, adding `plexus` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use plexus::prelude::*;
//!
//! let mut engine = Engine::new();
//! engine
//!     .add_device(
//!         "main",
//!         [Port::new("in", 0), Port::empty("out")],
//!         controller_fn(|mut ports, _ctx| {
//!             let input = ports.require("in")?.value().as_int()?;
//!             ports.set("out", input + 2)
//!         }),
//!     )
//!     .unwrap();
//! engine
//!     .add_device(
//!         "lookup",
//!         [Port::new("values", 0)],
//!         LookupTable::new().with_series("values", TimeSeries::new([(0, 3), (1, 4)]).unwrap()),
//!     )
//!     .unwrap();
//! engine.add_connection("lookup", "values", "main", "in").unwrap();
//!
//! engine.run_cycles(3).unwrap();
//! assert_eq!(engine.current_cycle(), CycleId(3));
//! assert_eq!(engine.port_value("main", "out"), Some(&Value::Int(6)));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `plexus-core` | Values, ports, clients, connections, unit traits |
//! | [`engine`] | `plexus-engine` | Cycle engine and periodic realtime driver |
//! | [`controllers`] | `plexus-controllers` | Lookup tables, recorders, closure adapters |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`plexus-core`).
///
/// Contains the [`types::Value`] model, ports and clients, connections, the
/// per-cycle context, and the [`types::Controller`] and [`types::Service`]
/// traits.
pub use plexus_core as types;

/// Cycle engine and realtime driver (`plexus-engine`).
///
/// [`engine::Engine`] for caller-driven cycles,
/// [`engine::RealtimeEngine`] for periodic background execution.
pub use plexus_engine as engine;

/// Reference units (`plexus-controllers`).
///
/// Includes [`controllers::LookupTable`], [`controllers::Recorder`],
/// [`controllers::SeriesInjector`], and [`controllers::TopologyRecorder`].
pub use plexus_controllers as controllers;

/// Common imports for typical Plexus usage.
///
/// ```rust
/// use plexus::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use plexus_core::{
        Client, Clients, ClientsMut, Connection, Controller, CycleContext, CycleId, Endpoint,
        Port, Ports, PortsMut, Service, UserData, Value,
    };

    // Errors
    pub use plexus_core::{ExecuteError, ValueError};
    pub use plexus_engine::{CycleError, RealtimeError, RegistrationError};

    // Engine
    pub use plexus_engine::{
        CycleMetrics, Engine, MissedCycles, RealtimeConfig, RealtimeEngine, RunReport,
    };

    // Reference units
    pub use plexus_controllers::{
        controller_fn, service_fn, LookupTable, Recorder, SeriesInjector, TimeSeries,
        TopologyRecorder,
    };
}
