//! Directed value-copy edges between ports.

use std::fmt;

/// A `(client, port)` pair identifying one port in the topology.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Client name.
    pub client: String,
    /// Port name within the client.
    pub port: String,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(client: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.client, self.port)
    }
}

/// A directed edge copying the source port's value into the target port
/// once per cycle.
///
/// Connections are only constructed by the engine after both endpoints
/// have been validated, so a `Connection` handed to a service always
/// refers to existing ports.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    source: Endpoint,
    target: Endpoint,
}

impl Connection {
    /// Create a connection from `source` to `target`.
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self { source, target }
    }

    /// The port values are read from.
    pub fn source(&self) -> &Endpoint {
        &self.source
    }

    /// The port values are written to.
    pub fn target(&self) -> &Endpoint {
        &self.target
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
