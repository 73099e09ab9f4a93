//! Clients and the client registry.
//!
//! A [`Client`] is a named participant owning an ordered port set. The
//! registry ([`Clients`]) keeps clients in registration order, which is
//! the order the engine runs controllers in.
//!
//! Services receive a [`ClientsMut`] view rather than the registry itself:
//! they may rewrite any port value, but cannot add or remove clients.

use std::ops::Deref;

use indexmap::IndexMap;

use crate::error::ExecuteError;
use crate::port::{Port, Ports, PortsMut};
use crate::value::Value;

/// A named simulation participant and its ports.
#[derive(Clone, Debug, PartialEq)]
pub struct Client {
    name: String,
    ports: Ports,
}

impl Client {
    /// Create a client from a validated port set.
    pub fn new(name: impl Into<String>, ports: Ports) -> Self {
        Self {
            name: name.into(),
            ports,
        }
    }

    /// The client name, unique within a registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The client's ports.
    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    /// Mutable access to the client's ports. The port set itself is fixed;
    /// only values change.
    pub fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }
}

/// Registry of clients in registration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clients {
    inner: IndexMap<String, Client>,
}

impl Clients {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a client, returning its registration index.
    ///
    /// Returns the client back if the name is already taken.
    pub fn insert(&mut self, client: Client) -> Result<usize, Client> {
        if self.inner.contains_key(client.name()) {
            return Err(client);
        }
        let (index, _) = self.inner.insert_full(client.name().to_string(), client);
        Ok(index)
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether a client named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Look up a client by name.
    pub fn get(&self, name: &str) -> Option<&Client> {
        self.inner.get(name)
    }

    /// Look up a client by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Client> {
        self.inner.get_mut(name)
    }

    /// Registration index of a client.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.inner.get_index_of(name)
    }

    /// Client at a registration index.
    pub fn get_index(&self, index: usize) -> Option<&Client> {
        self.inner.get_index(index).map(|(_, client)| client)
    }

    /// Mutable client at a registration index.
    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Client> {
        self.inner.get_index_mut(index).map(|(_, client)| client)
    }

    /// Look up a port by client and port name.
    pub fn port(&self, client: &str, port: &str) -> Option<&Port> {
        self.inner.get(client)?.ports().get(port)
    }

    /// Current value of a port by client and port name.
    pub fn port_value(&self, client: &str, port: &str) -> Option<&Value> {
        self.port(client, port).map(Port::value)
    }

    /// Mutable port by client and port name.
    pub fn port_mut(&mut self, client: &str, port: &str) -> Option<&mut Port> {
        self.inner.get_mut(client)?.ports_mut().get_mut(port)
    }

    /// Mutable port, failing with [`ExecuteError::MissingClient`] or
    /// [`ExecuteError::MissingPort`].
    pub fn require_port_mut(&mut self, client: &str, port: &str) -> Result<&mut Port, ExecuteError> {
        self.inner
            .get_mut(client)
            .ok_or_else(|| ExecuteError::MissingClient {
                client: client.to_string(),
            })?
            .ports_mut()
            .require_mut(port)
    }

    /// Iterate clients in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.inner.values()
    }

    /// Iterate clients mutably in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Client> {
        self.inner.values_mut()
    }

    /// Client names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}

/// Service view of the registry: port values are writable, the client set
/// and each client's port set are not.
///
/// Read-only registry methods are reachable through [`Deref`]. Mutable
/// access yields `&mut Value` or a [`PortsMut`] view, never `&mut Client`
/// or `&mut Port`, so services cannot rename, add or remove clients or
/// ports.
///
/// ```compile_fail
/// use plexus_core::{Client, ClientsMut, Ports};
///
/// fn rename(mut clients: ClientsMut<'_>) {
///     if let Some(client) = clients.get_mut("t") {
///         *client = Client::new("other", Ports::default());
///     }
/// }
/// ```
#[derive(Debug)]
pub struct ClientsMut<'a> {
    inner: &'a mut Clients,
}

impl<'a> ClientsMut<'a> {
    /// Wrap a registry. Typically called by the engine, not by services.
    pub fn new(inner: &'a mut Clients) -> Self {
        Self { inner }
    }

    /// Writable view of one client's ports.
    pub fn ports_mut(&mut self, client: &str) -> Option<PortsMut<'_>> {
        self.inner
            .inner
            .get_mut(client)
            .map(|c| PortsMut::new(&mut c.ports))
    }

    /// Mutable value of `client.port`, if both exist.
    pub fn value_mut(&mut self, client: &str, port: &str) -> Option<&mut Value> {
        self.inner.port_mut(client, port).map(Port::value_mut)
    }

    /// Mutable value of `client.port`, failing with
    /// [`ExecuteError::MissingClient`] or [`ExecuteError::MissingPort`].
    pub fn require_value_mut(&mut self, client: &str, port: &str) -> Result<&mut Value, ExecuteError> {
        self.inner.require_port_mut(client, port).map(Port::value_mut)
    }

    /// Overwrite `client.port`, failing like
    /// [`require_value_mut`](ClientsMut::require_value_mut).
    pub fn set(&mut self, client: &str, port: &str, value: impl Into<Value>) -> Result<(), ExecuteError> {
        *self.require_value_mut(client, port)? = value.into();
        Ok(())
    }

    /// Iterate `(client name, ports view)` pairs in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, PortsMut<'_>)> {
        self.inner
            .inner
            .iter_mut()
            .map(|(name, client)| (name.as_str(), PortsMut::new(&mut client.ports)))
    }
}

impl Deref for ClientsMut<'_> {
    type Target = Clients;

    fn deref(&self) -> &Clients {
        &*self.inner
    }
}
