//! Core types and traits for the Plexus cycle simulation framework.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! data model shared by every other crate in the workspace: loosely-typed
//! port values, ports and clients, connections, the per-cycle context, the
//! error types raised by units, and the two execution contracts
//! ([`Controller`] and [`Service`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod client;
pub mod connection;
pub mod context;
pub mod error;
pub mod id;
pub mod port;
pub mod traits;
pub mod value;

pub use client::{Client, Clients, ClientsMut};
pub use connection::{Connection, Endpoint};
pub use context::{CycleContext, UserData};
pub use error::{DuplicatePort, ExecuteError, ValueError};
pub use id::CycleId;
pub use port::{Port, Ports, PortsMut};
pub use traits::{Controller, Service};
pub use value::{Value, ValueKind};
