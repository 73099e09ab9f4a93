//! Closure adapters and the no-op controller.

use std::fmt;

use plexus_core::{ClientsMut, Connection, Controller, CycleContext, ExecuteError, PortsMut, Service};

/// A client that only holds ports and runs no logic.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopController;

impl Controller for NoopController {
    fn execute(&mut self, _ports: PortsMut<'_>, _ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        Ok(())
    }
}

/// Controller backed by a closure. Built with [`controller_fn`].
pub struct FnController<F> {
    f: F,
}

/// Wrap a closure as a [`Controller`].
///
/// ```
/// use plexus_controllers::controller_fn;
///
/// let add_two = controller_fn(|mut ports, _ctx| {
///     let input = ports.require("in")?.value().as_int()?;
///     ports.set("out", input + 2)
/// });
/// # let _ = add_two;
/// ```
pub fn controller_fn<F>(f: F) -> FnController<F>
where
    F: FnMut(PortsMut<'_>, &mut CycleContext<'_>) -> Result<(), ExecuteError> + Send + 'static,
{
    FnController { f }
}

impl<F> Controller for FnController<F>
where
    F: FnMut(PortsMut<'_>, &mut CycleContext<'_>) -> Result<(), ExecuteError> + Send + 'static,
{
    fn execute(&mut self, ports: PortsMut<'_>, ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        (self.f)(ports, ctx)
    }
}

impl<F> fmt::Debug for FnController<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnController").finish_non_exhaustive()
    }
}

/// Service backed by a closure. Built with [`service_fn`].
pub struct FnService<F> {
    name: String,
    f: F,
}

/// Wrap a closure as a named [`Service`].
pub fn service_fn<F>(name: impl Into<String>, f: F) -> FnService<F>
where
    F: FnMut(ClientsMut<'_>, &[Connection], &mut CycleContext<'_>) -> Result<(), ExecuteError>
        + Send
        + 'static,
{
    FnService {
        name: name.into(),
        f,
    }
}

impl<F> Service for FnService<F>
where
    F: FnMut(ClientsMut<'_>, &[Connection], &mut CycleContext<'_>) -> Result<(), ExecuteError>
        + Send
        + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &mut self,
        clients: ClientsMut<'_>,
        connections: &[Connection],
        ctx: &mut CycleContext<'_>,
    ) -> Result<(), ExecuteError> {
        (self.f)(clients, connections, ctx)
    }
}

impl<F> fmt::Debug for FnService<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnService")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
