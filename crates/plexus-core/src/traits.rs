//! Execution contracts for per-client and cross-cutting logic.
//!
//! The engine treats every unit as opaque: it calls `execute()` once per
//! cycle and only looks at whether it returned `Err`. A failing unit
//! aborts the cycle; effects already applied are not rolled back.

use crate::client::ClientsMut;
use crate::connection::Connection;
use crate::context::CycleContext;
use crate::error::ExecuteError;
use crate::port::PortsMut;

/// Per-client logic, run once per cycle against the owning client's ports.
///
/// Controllers run after propagation, so the ports they see hold this
/// cycle's propagated values. They receive a [`PortsMut`] view: values
/// can be rewritten, the port set cannot.
///
/// # Object safety
///
/// This trait is object-safe; the engine stores controllers as
/// `Box<dyn Controller>`.
///
/// # Examples
///
/// ```
/// use plexus_core::{Controller, CycleContext, ExecuteError, PortsMut};
///
/// struct AddTwo;
///
/// impl Controller for AddTwo {
///     fn execute(&mut self, mut ports: PortsMut<'_>, _ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
///         let input = ports.require("in")?.value().as_int()?;
///         ports.set("out", input + 2)
///     }
/// }
/// ```
pub trait Controller: Send + 'static {
    /// Execute one cycle of logic.
    fn execute(&mut self, ports: PortsMut<'_>, ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError>;
}

/// Cross-cutting logic, run once per cycle before propagation.
///
/// Services see the whole topology: every client's ports (writable) and
/// the connection list (read-only). They run in descending priority
/// order, ties broken by registration order.
pub trait Service: Send + 'static {
    /// Human-readable name for error reporting and metrics.
    ///
    /// Defaults to the implementing type's name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Execute one cycle of logic.
    fn execute(
        &mut self,
        clients: ClientsMut<'_>,
        connections: &[Connection],
        ctx: &mut CycleContext<'_>,
    ) -> Result<(), ExecuteError>;
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn execute(&mut self, ports: PortsMut<'_>, ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        (**self).execute(ports, ctx)
    }
}

impl<S: Service + ?Sized> Service for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn execute(
        &mut self,
        clients: ClientsMut<'_>,
        connections: &[Connection],
        ctx: &mut CycleContext<'_>,
    ) -> Result<(), ExecuteError> {
        (**self).execute(clients, connections, ctx)
    }
}
