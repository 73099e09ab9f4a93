//! Reference controllers and services for the Plexus cycle simulation
//! framework.
//!
//! Table-driven value injection, value recording, and closure adapters.
//! None of these get special treatment from the engine; they implement
//! [`Controller`](plexus_core::Controller) or
//! [`Service`](plexus_core::Service) like any user unit.
//!
//! | Unit | Kind | Effect per cycle |
//! |------|------|------------------|
//! | [`LookupTable`] | controller | sets its client's ports from [`TimeSeries`] |
//! | [`Recorder`] | controller | appends its client's port values to a [`History`] |
//! | [`SeriesInjector`] | service | sets any client's ports from [`TimeSeries`] |
//! | [`TopologyRecorder`] | service | appends every port value to a [`TopologyHistory`] |
//! | [`NoopController`] | controller | nothing |

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod func;
pub mod injector;
pub mod lookup;
pub mod recorder;
pub mod series;
pub mod topology_recorder;

pub use func::{controller_fn, service_fn, FnController, FnService, NoopController};
pub use injector::SeriesInjector;
pub use lookup::LookupTable;
pub use recorder::{History, Recorder};
pub use series::{SeriesError, TimeSeries};
pub use topology_recorder::{TopologyHistory, TopologyRecorder};
