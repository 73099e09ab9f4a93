//! Named value cells and the ordered port set owned by each client.
//!
//! Units never receive `&mut Ports`. Controllers get a [`PortsMut`] view
//! that can rewrite values but cannot add, remove, rename or reorder
//! ports, so connections resolved at registration stay valid for the
//! life of the engine.

use std::ops::Deref;

use indexmap::IndexMap;

use crate::error::{DuplicatePort, ExecuteError};
use crate::value::Value;

/// A named, mutable value cell.
///
/// The name is fixed at construction; the value is overwritten by
/// connection propagation and by unit logic.
#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    name: String,
    value: Value,
}

impl Port {
    /// Create a port holding `value`.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a port holding [`Value::None`].
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Value::None)
    }

    /// The port name, unique within its client.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access to the current value.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Overwrite the current value.
    pub fn set(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    /// Overwrite the current value, returning the previous one.
    pub fn replace(&mut self, value: impl Into<Value>) -> Value {
        std::mem::replace(&mut self.value, value.into())
    }
}

/// Ordered set of ports, keyed by name.
///
/// Iteration follows declaration order. Names are unique: building a set
/// from a list containing a repeated name fails with [`DuplicatePort`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ports {
    inner: IndexMap<String, Port>,
}

impl Ports {
    /// Build a port set, rejecting repeated names.
    pub fn from_ports(ports: impl IntoIterator<Item = Port>) -> Result<Self, DuplicatePort> {
        let mut inner = IndexMap::new();
        for port in ports {
            if inner.contains_key(port.name()) {
                return Err(DuplicatePort {
                    port: port.name().to_string(),
                });
            }
            inner.insert(port.name().to_string(), port);
        }
        Ok(Self { inner })
    }

    /// Number of ports.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the set has no ports.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether a port named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Look up a port by name.
    pub fn get(&self, name: &str) -> Option<&Port> {
        self.inner.get(name)
    }

    /// Look up a port by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.inner.get_mut(name)
    }

    /// Look up a port, failing with [`ExecuteError::MissingPort`].
    ///
    /// Intended for unit logic, where a missing port is a failure of
    /// the unit rather than a lookup miss.
    pub fn require(&self, name: &str) -> Result<&Port, ExecuteError> {
        self.inner.get(name).ok_or_else(|| missing(name))
    }

    /// Mutable counterpart of [`require`](Ports::require).
    pub fn require_mut(&mut self, name: &str) -> Result<&mut Port, ExecuteError> {
        self.inner.get_mut(name).ok_or_else(|| missing(name))
    }

    /// Current value of a port, if it exists.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.inner.get(name).map(Port::value)
    }

    /// Overwrite a port's value, failing if the port does not exist.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ExecuteError> {
        self.require_mut(name)?.set(value);
        Ok(())
    }

    /// Position of a port in declaration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.inner.get_index_of(name)
    }

    /// Port at a declaration-order position.
    pub fn get_index(&self, index: usize) -> Option<&Port> {
        self.inner.get_index(index).map(|(_, port)| port)
    }

    /// Mutable port at a declaration-order position.
    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Port> {
        self.inner.get_index_mut(index).map(|(_, port)| port)
    }

    /// Iterate ports in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.inner.values()
    }

    /// Iterate ports mutably in declaration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.inner.values_mut()
    }

    /// Port names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}

/// Unit view of a port set: values are writable, the set is not.
///
/// Read-only [`Ports`] methods are reachable through [`Deref`]. There is
/// no `DerefMut`, and mutable access yields `&mut Value`, never
/// `&mut Port`, so a port's name and position are fixed.
///
/// ```compile_fail
/// use plexus_core::{Ports, PortsMut};
///
/// fn swap_ports(mut ports: PortsMut<'_>) {
///     let set: &mut Ports = &mut *ports;
///     *set = Ports::default();
/// }
/// ```
#[derive(Debug)]
pub struct PortsMut<'a> {
    inner: &'a mut Ports,
}

impl<'a> PortsMut<'a> {
    /// Wrap a port set. Typically called by the engine, not by units.
    pub fn new(inner: &'a mut Ports) -> Self {
        Self { inner }
    }

    /// Overwrite a port's value, failing if the port does not exist.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ExecuteError> {
        self.inner.set(name, value)
    }

    /// Overwrite a port's value, returning the previous one.
    pub fn replace(&mut self, name: &str, value: impl Into<Value>) -> Result<Value, ExecuteError> {
        Ok(self.inner.require_mut(name)?.replace(value))
    }

    /// Mutable access to a port's value, if the port exists.
    pub fn value_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.inner.get_mut(name).map(Port::value_mut)
    }

    /// Mutable access to a port's value, failing with
    /// [`ExecuteError::MissingPort`].
    pub fn require_value_mut(&mut self, name: &str) -> Result<&mut Value, ExecuteError> {
        self.inner.require_mut(name).map(Port::value_mut)
    }

    /// Iterate `(name, value)` pairs mutably in declaration order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.inner
            .inner
            .iter_mut()
            .map(|(name, port)| (name.as_str(), &mut port.value))
    }
}

impl Deref for PortsMut<'_> {
    type Target = Ports;

    fn deref(&self) -> &Ports {
        &*self.inner
    }
}

fn missing(name: &str) -> ExecuteError {
    ExecuteError::MissingPort {
        port: name.to_string(),
    }
}
