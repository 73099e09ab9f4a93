//! Synchronous cycle engine.
//!
//! [`Engine`] owns the client registry, the connection list, the service
//! list and the run [`State`]. Each call to
//! [`next_cycle()`](Engine::next_cycle) runs one complete cycle:
//!
//! 1. services, in descending priority (ties in registration order),
//! 2. propagation along every connection, in registration order,
//! 3. controllers, in client registration order,
//! 4. the cycle counter advances.
//!
//! # Topology
//!
//! Clients, connections and services are registered before the first
//! cycle. The first `next_cycle()` call freezes the topology; later
//! registrations fail with [`RegistrationError::TopologyFrozen`].
//!
//! # Failure
//!
//! A unit returning `Err` aborts the cycle at that point. Effects of the
//! units and phases that already ran remain in place and the cycle counter
//! is not advanced. Panics are not caught.

use std::fmt;
use std::time::Instant;

use plexus_core::{
    Client, Clients, ClientsMut, Connection, Controller, CycleId, Endpoint, Port, Ports, PortsMut,
    Service, UserData, Value,
};

use crate::error::{CycleError, EndpointFault, RegistrationError};
use crate::metrics::CycleMetrics;
use crate::state::State;

// Compile-time assertion: Engine is Send so it can be moved onto the
// realtime worker thread. Fails to compile if any field is !Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Engine>();
    }
};

// ── Internal routing ─────────────────────────────────────────────

/// Resolved position of a port: client registration index and port
/// declaration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PortAddr {
    client: usize,
    port: usize,
}

/// A connection resolved to indices at registration time.
#[derive(Clone, Copy, Debug)]
struct Route {
    source: PortAddr,
    target: PortAddr,
}

struct ServiceEntry {
    priority: i32,
    service: Box<dyn Service>,
}

// ── Engine ───────────────────────────────────────────────────────

/// Single-threaded, deterministic cycle engine.
///
/// `Engine` is [`Send`] but not [`Sync`]: all mutation goes through
/// `&mut self`, so a cycle can never interleave with registration or with
/// another cycle.
///
/// # Example
///
/// ```
/// use plexus_core::{Controller, CycleContext, ExecuteError, Port, PortsMut, Value};
/// use plexus_engine::Engine;
///
/// struct AddTwo;
///
/// impl Controller for AddTwo {
///     fn execute(&mut self, mut ports: PortsMut<'_>, _ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
///         let input = ports.require("in")?.value().as_int()?;
///         ports.set("out", input + 2)
///     }
/// }
///
/// let mut engine = Engine::new();
/// engine.add_device("main", [Port::new("in", 1), Port::new("out", 0)], AddTwo).unwrap();
/// engine.next_cycle().unwrap();
/// assert_eq!(engine.port_value("main", "out"), Some(&Value::Int(3)));
/// ```
pub struct Engine {
    clients: Clients,
    /// Indexed by client registration order.
    controllers: Vec<Box<dyn Controller>>,
    connections: Vec<Connection>,
    /// Parallel to `connections`.
    routes: Vec<Route>,
    /// Kept sorted in execution order.
    services: Vec<ServiceEntry>,
    state: State,
    frozen: bool,
    last_metrics: Option<CycleMetrics>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an empty engine at cycle 0 with empty user data.
    pub fn new() -> Self {
        Self::with_user_data(UserData::new())
    }

    /// Create an empty engine at cycle 0 holding `user` as its initial
    /// user data.
    pub fn with_user_data(user: UserData) -> Self {
        Self {
            clients: Clients::new(),
            controllers: Vec::new(),
            connections: Vec::new(),
            routes: Vec::new(),
            services: Vec::new(),
            state: State::new(user),
            frozen: false,
            last_metrics: None,
        }
    }

    // ── Registration ─────────────────────────────────────────────

    /// Register a client with its ports and controller.
    ///
    /// Ports keep their declaration order. The controller runs once per
    /// cycle, after all clients registered before this one.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::DuplicateName`] if `name` is taken.
    /// - [`RegistrationError::InvalidPortSet`] if two ports share a name.
    /// - [`RegistrationError::TopologyFrozen`] once cycles have started.
    pub fn add_device<C: Controller>(
        &mut self,
        name: impl Into<String>,
        ports: impl IntoIterator<Item = Port>,
        controller: C,
    ) -> Result<(), RegistrationError> {
        self.ensure_open()?;
        let name = name.into();
        if self.clients.contains(&name) {
            return Err(RegistrationError::DuplicateName { name });
        }
        let ports = Ports::from_ports(ports).map_err(|dup| RegistrationError::InvalidPortSet {
            client: name.clone(),
            port: dup.port,
        })?;
        let port_count = ports.len();
        let index = self
            .clients
            .insert(Client::new(name, ports))
            .map_err(|client| RegistrationError::DuplicateName {
                name: client.name().to_string(),
            })?;
        self.controllers.push(Box::new(controller));
        debug_assert_eq!(self.controllers.len(), index + 1);
        tracing::debug!(
            client = self.clients.get_index(index).map(Client::name),
            index,
            ports = port_count,
            "registered client"
        );
        Ok(())
    }

    /// Register a connection copying `src_client.src_port` into
    /// `dst_client.dst_port` once per cycle.
    ///
    /// Several connections may share a source or a target. When two
    /// target the same port, the one registered last wins.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::UnknownEndpoint`] if either endpoint does
    ///   not resolve. The source is checked first.
    /// - [`RegistrationError::TopologyFrozen`] once cycles have started.
    pub fn add_connection(
        &mut self,
        src_client: &str,
        src_port: &str,
        dst_client: &str,
        dst_port: &str,
    ) -> Result<(), RegistrationError> {
        self.ensure_open()?;
        let source = Endpoint::new(src_client, src_port);
        let target = Endpoint::new(dst_client, dst_port);
        let route = Route {
            source: self.resolve(&source)?,
            target: self.resolve(&target)?,
        };
        let connection = Connection::new(source, target);
        tracing::debug!(%connection, "registered connection");
        self.connections.push(connection);
        self.routes.push(route);
        Ok(())
    }

    /// Register a service at priority 0.
    ///
    /// See [`add_service_with_priority`](Engine::add_service_with_priority).
    pub fn add_service<S: Service>(&mut self, service: S) -> Result<(), RegistrationError> {
        self.add_service_with_priority(service, 0)
    }

    /// Register a service. Higher priorities run earlier; equal priorities
    /// run in registration order.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::TopologyFrozen`] once cycles have started.
    pub fn add_service_with_priority<S: Service>(
        &mut self,
        service: S,
        priority: i32,
    ) -> Result<(), RegistrationError> {
        self.ensure_open()?;
        // Insert after every entry with priority >= this one, which keeps
        // equal priorities in registration order.
        let position = self.services.partition_point(|e| e.priority >= priority);
        tracing::debug!(
            service = service.name(),
            priority,
            position,
            "registered service"
        );
        self.services.insert(
            position,
            ServiceEntry {
                priority,
                service: Box::new(service),
            },
        );
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), RegistrationError> {
        if self.frozen {
            return Err(RegistrationError::TopologyFrozen {
                cycle: self.state.cycle(),
            });
        }
        Ok(())
    }

    fn resolve(&self, endpoint: &Endpoint) -> Result<PortAddr, RegistrationError> {
        let unknown = |fault| RegistrationError::UnknownEndpoint {
            endpoint: endpoint.clone(),
            fault,
        };
        let client = self
            .clients
            .index_of(&endpoint.client)
            .ok_or_else(|| unknown(EndpointFault::NoSuchClient))?;
        let port = self
            .clients
            .get_index(client)
            .and_then(|c| c.ports().index_of(&endpoint.port))
            .ok_or_else(|| unknown(EndpointFault::NoSuchPort))?;
        Ok(PortAddr { client, port })
    }

    // ── Execution ────────────────────────────────────────────────

    /// Execute exactly one cycle.
    ///
    /// Freezes the topology on first call. On success the cycle counter
    /// advances by one and [`last_metrics()`](Engine::last_metrics) is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError`] naming the first unit that failed. The cycle
    /// stops there: later units do not run, nothing is rolled back, and
    /// the counter does not advance.
    pub fn next_cycle(&mut self) -> Result<(), CycleError> {
        self.frozen = true;
        let cycle_start = Instant::now();
        let cycle = self.state.cycle();

        let Self {
            clients,
            controllers,
            connections,
            routes,
            services,
            state,
            ..
        } = self;

        // 1. Services.
        let mut service_us = Vec::with_capacity(services.len());
        for entry in services.iter_mut() {
            let start = Instant::now();
            let mut ctx = state.context();
            entry
                .service
                .execute(ClientsMut::new(clients), connections.as_slice(), &mut ctx)
                .map_err(|source| CycleError::ServiceFailed {
                    service: entry.service.name().to_string(),
                    cycle,
                    source,
                })?;
            service_us.push((entry.service.name().to_string(), elapsed_us(start)));
        }

        // 2. Propagation.
        let propagation_start = Instant::now();
        for route in routes.iter() {
            propagate(clients, *route);
        }
        let propagation_us = elapsed_us(propagation_start);

        // 3. Controllers.
        let controller_start = Instant::now();
        for (index, controller) in controllers.iter_mut().enumerate() {
            let Some(client) = clients.get_index_mut(index) else {
                continue;
            };
            let mut ctx = state.context();
            controller
                .execute(PortsMut::new(client.ports_mut()), &mut ctx)
                .map_err(|source| CycleError::ControllerFailed {
                    client: client.name().to_string(),
                    cycle,
                    source,
                })?;
        }
        let controller_us = elapsed_us(controller_start);

        // 4. Advance.
        state.advance();

        let metrics = CycleMetrics {
            cycle,
            total_us: elapsed_us(cycle_start),
            service_us,
            propagation_us,
            controller_us,
            connections: routes.len(),
        };
        tracing::trace!(
            cycle = cycle.0,
            total_us = metrics.total_us,
            propagation_us,
            controller_us,
            "cycle complete"
        );
        self.last_metrics = Some(metrics);
        Ok(())
    }

    /// Run `n` cycles, stopping at the first failure.
    pub fn run_cycles(&mut self, n: u64) -> Result<(), CycleError> {
        for _ in 0..n {
            self.next_cycle()?;
        }
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────

    /// The run state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Number of completed cycles.
    pub fn current_cycle(&self) -> CycleId {
        self.state.cycle()
    }

    /// Mutable user data, for seeding or inspection between cycles.
    pub fn user_data_mut(&mut self) -> &mut UserData {
        self.state.user_mut()
    }

    /// The client registry.
    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Look up a client by name.
    pub fn client(&self, name: &str) -> Option<&Client> {
        self.clients.get(name)
    }

    /// Current value of `client.port`.
    pub fn port_value(&self, client: &str, port: &str) -> Option<&Value> {
        self.clients.port_value(client, port)
    }

    /// Overwrite `client.port` between cycles.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::UnknownEndpoint`] if the port does not exist.
    pub fn set_port_value(
        &mut self,
        client: &str,
        port: &str,
        value: impl Into<Value>,
    ) -> Result<(), RegistrationError> {
        let addr = self.resolve(&Endpoint::new(client, port))?;
        if let Some(target) = port_at_mut(&mut self.clients, addr) {
            target.set(value);
        }
        Ok(())
    }

    /// Registered connections, in propagation order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Service names in execution order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|e| e.service.name())
    }

    /// Metrics from the most recent successful cycle.
    pub fn last_metrics(&self) -> Option<&CycleMetrics> {
        self.last_metrics.as_ref()
    }

    /// Whether cycles have started and the topology is fixed.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("cycle", &self.state.cycle())
            .field("clients", &self.clients.names().collect::<Vec<_>>())
            .field("connections", &self.connections.len())
            .field("services", &self.service_names().collect::<Vec<_>>())
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}

// Routes are resolved at registration. Units only reach ports through
// `PortsMut` and `ClientsMut`, which cannot add, remove or reorder
// clients or ports, so both indices stay valid.
fn propagate(clients: &mut Clients, route: Route) {
    let value = port_at(clients, route.source).map(|p| p.value().clone());
    let target = port_at_mut(clients, route.target);
    debug_assert!(
        value.is_some() && target.is_some(),
        "stale route {route:?}"
    );
    if let (Some(value), Some(target)) = (value, target) {
        target.set(value);
    }
}

fn port_at(clients: &Clients, addr: PortAddr) -> Option<&Port> {
    clients.get_index(addr.client)?.ports().get_index(addr.port)
}

fn port_at_mut(clients: &mut Clients, addr: PortAddr) -> Option<&mut Port> {
    clients
        .get_index_mut(addr.client)?
        .ports_mut()
        .get_index_mut(addr.port)
}

fn elapsed_us(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_controllers::{controller_fn, service_fn, NoopController};
    use plexus_core::ExecuteError;
    use plexus_test_utils::{
        EventLog, FailingController, FailingService, Phase, ProbeController, ProbeService,
    };

    fn copy_in_to_out() -> impl Controller {
        controller_fn(|mut ports, _ctx| {
            let v = ports.require("in")?.value().clone();
            ports.set("out", v)
        })
    }

    // ── Registration ─────────────────────────────────────────────

    #[test]
    fn duplicate_client_name_is_rejected() {
        let mut engine = Engine::new();
        engine.add_device("x", [Port::new("p", 1)], NoopController).unwrap();
        let err = engine
            .add_device("x", [Port::new("q", 2)], NoopController)
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateName {
                name: "x".to_string()
            }
        );
        // The first registration is untouched.
        assert_eq!(engine.clients().len(), 1);
        assert_eq!(engine.port_value("x", "p"), Some(&Value::Int(1)));
    }

    #[test]
    fn duplicate_port_name_is_rejected() {
        let mut engine = Engine::new();
        let err = engine
            .add_device("x", [Port::new("p", 1), Port::new("p", 2)], NoopController)
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::InvalidPortSet {
                client: "x".to_string(),
                port: "p".to_string()
            }
        );
        assert!(engine.clients().is_empty());
    }

    #[test]
    fn connection_endpoints_must_resolve() {
        let mut engine = Engine::new();
        engine.add_device("a", [Port::new("out", 0)], NoopController).unwrap();
        engine.add_device("b", [Port::new("in", 0)], NoopController).unwrap();

        let err = engine.add_connection("a", "out", "b", "nope").unwrap_err();
        assert_eq!(
            err,
            RegistrationError::UnknownEndpoint {
                endpoint: Endpoint::new("b", "nope"),
                fault: EndpointFault::NoSuchPort
            }
        );
        let err = engine.add_connection("ghost", "out", "b", "in").unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::UnknownEndpoint {
                fault: EndpointFault::NoSuchClient,
                ..
            }
        ));
        assert!(engine.connections().is_empty());

        engine.add_connection("a", "out", "b", "in").unwrap();
        assert_eq!(engine.connections().len(), 1);
    }

    #[test]
    fn topology_freezes_on_first_cycle() {
        let mut engine = Engine::new();
        engine.add_device("a", [Port::new("p", 0)], NoopController).unwrap();
        assert!(!engine.is_frozen());
        engine.next_cycle().unwrap();
        assert!(engine.is_frozen());

        let frozen = RegistrationError::TopologyFrozen { cycle: CycleId(1) };
        assert_eq!(
            engine.add_device("b", [Port::empty("p")], NoopController),
            Err(frozen.clone())
        );
        assert_eq!(engine.add_connection("a", "p", "a", "p"), Err(frozen.clone()));
        assert_eq!(engine.add_service(FailingService::new("s", 0)), Err(frozen));
    }

    #[test]
    fn topology_freezes_even_when_first_cycle_fails() {
        let mut engine = Engine::new();
        engine.add_device("a", [], FailingController::new(0)).unwrap();
        assert!(engine.next_cycle().is_err());
        assert!(matches!(
            engine.add_device("b", [], NoopController),
            Err(RegistrationError::TopologyFrozen { cycle: CycleId(0) })
        ));
    }

    // ── Cycle protocol ───────────────────────────────────────────

    #[test]
    fn phases_run_services_then_propagation_then_controllers() {
        let log = EventLog::new();
        let mut engine = Engine::new();
        engine
            .add_device("src", [Port::new("out", 7)], NoopController)
            .unwrap();
        engine
            .add_device(
                "dst",
                [Port::new("in", 0)],
                ProbeController::new("dst", &log).watching("in"),
            )
            .unwrap();
        engine.add_connection("src", "out", "dst", "in").unwrap();
        engine
            .add_service(ProbeService::new("svc", &log).watching("dst", "in"))
            .unwrap();

        engine.next_cycle().unwrap();

        let events = log.events();
        assert_eq!(events.len(), 2);
        // The service sees the pre-propagation value.
        assert_eq!(events[0].phase, Phase::Service);
        assert_eq!(events[0].observed, Value::Int(0));
        // The controller sees the propagated value.
        assert_eq!(events[1].phase, Phase::Controller);
        assert_eq!(events[1].observed, Value::Int(7));
    }

    #[test]
    fn controllers_run_in_registration_order() {
        let log = EventLog::new();
        let mut engine = Engine::new();
        for name in ["c", "a", "b"] {
            engine
                .add_device(name, [], ProbeController::new(name, &log))
                .unwrap();
        }
        engine.run_cycles(2).unwrap();
        assert_eq!(log.units(), ["c", "a", "b", "c", "a", "b"]);
    }

    #[test]
    fn services_run_by_descending_priority_with_stable_ties() {
        let log = EventLog::new();
        let mut engine = Engine::new();
        engine
            .add_service_with_priority(ProbeService::new("zero", &log), 0)
            .unwrap();
        engine
            .add_service_with_priority(ProbeService::new("ten-a", &log), 10)
            .unwrap();
        engine
            .add_service_with_priority(ProbeService::new("thousand", &log), 1000)
            .unwrap();
        engine
            .add_service_with_priority(ProbeService::new("ten-b", &log), 10)
            .unwrap();
        engine
            .add_service_with_priority(ProbeService::new("negative", &log), -5)
            .unwrap();

        let expected = ["thousand", "ten-a", "ten-b", "zero", "negative"];
        assert_eq!(engine.service_names().collect::<Vec<_>>(), expected);
        engine.next_cycle().unwrap();
        assert_eq!(log.units(), expected);
    }

    #[test]
    fn last_registered_connection_wins() {
        let mut engine = Engine::new();
        engine.add_device("a", [Port::new("out", 1)], NoopController).unwrap();
        engine.add_device("b", [Port::new("out", 2)], NoopController).unwrap();
        engine.add_device("t", [Port::new("in", 0)], NoopController).unwrap();
        engine.add_connection("b", "out", "t", "in").unwrap();
        engine.add_connection("a", "out", "t", "in").unwrap();

        engine.next_cycle().unwrap();
        assert_eq!(engine.port_value("t", "in"), Some(&Value::Int(1)));
    }

    #[test]
    fn propagation_uses_registration_order_for_chains() {
        // a.out -> b.in registered before b.in -> c.in: the second copy
        // sees the value the first one just wrote.
        let mut engine = Engine::new();
        engine.add_device("a", [Port::new("out", 5)], NoopController).unwrap();
        engine.add_device("b", [Port::new("in", 0)], NoopController).unwrap();
        engine.add_device("c", [Port::new("in", 0)], NoopController).unwrap();
        engine.add_connection("a", "out", "b", "in").unwrap();
        engine.add_connection("b", "in", "c", "in").unwrap();

        engine.next_cycle().unwrap();
        assert_eq!(engine.port_value("c", "in"), Some(&Value::Int(5)));
    }

    #[test]
    fn propagation_deep_copies_composite_values() {
        let mut engine = Engine::new();
        engine
            .add_device(
                "src",
                [Port::new("out", Value::List(vec![Value::Int(1)]))],
                NoopController,
            )
            .unwrap();
        engine
            .add_device(
                "dst",
                [Port::empty("in")],
                controller_fn(|mut ports, _ctx| {
                    if let Value::List(items) = ports.require_value_mut("in")? {
                        items.push(Value::Int(99));
                    }
                    Ok(())
                }),
            )
            .unwrap();
        engine.add_connection("src", "out", "dst", "in").unwrap();

        engine.next_cycle().unwrap();
        assert_eq!(
            engine.port_value("src", "out"),
            Some(&Value::List(vec![Value::Int(1)]))
        );
        assert_eq!(
            engine.port_value("dst", "in"),
            Some(&Value::List(vec![Value::Int(1), Value::Int(99)]))
        );
    }

    #[test]
    fn cycle_counter_counts_completed_cycles() {
        let mut engine = Engine::new();
        assert_eq!(engine.current_cycle(), CycleId(0));
        engine.run_cycles(5).unwrap();
        assert_eq!(engine.current_cycle(), CycleId(5));
        assert_eq!(engine.state().cycle(), CycleId(5));
    }

    #[test]
    fn units_see_current_cycle_and_share_user_data() {
        let mut engine = Engine::with_user_data(UserData::from([(
            "count".to_string(),
            Value::Int(100),
        )]));
        engine
            .add_service(service_fn("tally", |_clients, _conns, ctx| {
                let next = ctx.user().get("count").map_or(Ok(0), Value::as_int)? + 1;
                ctx.user_mut().insert("count".to_string(), Value::Int(next));
                Ok(())
            }))
            .unwrap();
        engine
            .add_device(
                "clock",
                [Port::new("now", -1)],
                controller_fn(|mut ports, ctx| ports.set("now", ctx.cycle().0 as i64)),
            )
            .unwrap();

        engine.run_cycles(3).unwrap();
        assert_eq!(engine.port_value("clock", "now"), Some(&Value::Int(2)));
        assert_eq!(engine.state().user().get("count"), Some(&Value::Int(103)));

        engine
            .user_data_mut()
            .insert("count".to_string(), Value::Int(0));
        engine.next_cycle().unwrap();
        assert_eq!(engine.state().user().get("count"), Some(&Value::Int(1)));
    }

    // ── Failure ──────────────────────────────────────────────────

    #[test]
    fn failing_controller_aborts_cycle_without_rollback() {
        let mut engine = Engine::new();
        engine.add_device("src", [Port::new("out", 3)], NoopController).unwrap();
        engine
            .add_device("first", [Port::new("in", 0), Port::new("out", 0)], copy_in_to_out())
            .unwrap();
        let failing = FailingController::new(1);
        let calls = failing.calls();
        engine.add_device("bad", [], failing).unwrap();
        let log = EventLog::new();
        engine
            .add_device("after", [], ProbeController::new("after", &log))
            .unwrap();
        engine.add_connection("src", "out", "first", "in").unwrap();

        engine.next_cycle().unwrap();
        engine.set_port_value("src", "out", 4).unwrap();

        let err = engine.next_cycle().unwrap_err();
        assert!(matches!(
            &err,
            CycleError::ControllerFailed { client, cycle: CycleId(1), .. } if client == "bad"
        ));
        assert!(matches!(err.execute_error(), ExecuteError::Failed { .. }));
        assert_eq!(calls.get(), 2);
        // Counter not advanced; earlier effects kept; later units skipped.
        assert_eq!(engine.current_cycle(), CycleId(1));
        assert_eq!(engine.port_value("first", "out"), Some(&Value::Int(4)));
        assert_eq!(log.units(), ["after"]);
    }

    #[test]
    fn failing_service_stops_before_propagation() {
        let mut engine = Engine::new();
        engine.add_device("a", [Port::new("out", 1)], NoopController).unwrap();
        engine.add_device("b", [Port::new("in", 0)], NoopController).unwrap();
        engine.add_connection("a", "out", "b", "in").unwrap();
        engine
            .add_service_with_priority(
                service_fn("writer", |mut clients, _conns, _ctx| {
                    clients.set("a", "out", 9)?;
                    Ok(())
                }),
                5,
            )
            .unwrap();
        engine.add_service(FailingService::new("broken", 0)).unwrap();

        let err = engine.next_cycle().unwrap_err();
        assert!(matches!(
            &err,
            CycleError::ServiceFailed { service, cycle: CycleId(0), .. } if service == "broken"
        ));
        // The higher-priority service's write stands; propagation never ran.
        assert_eq!(engine.port_value("a", "out"), Some(&Value::Int(9)));
        assert_eq!(engine.port_value("b", "in"), Some(&Value::Int(0)));
        assert_eq!(engine.current_cycle(), CycleId(0));
        assert!(engine.last_metrics().is_none());
    }

    #[test]
    fn run_cycles_stops_at_first_failure() {
        let mut engine = Engine::new();
        engine.add_device("bad", [], FailingController::new(3)).unwrap();
        let err = engine.run_cycles(10).unwrap_err();
        assert_eq!(err.cycle(), CycleId(3));
        assert_eq!(engine.current_cycle(), CycleId(3));
    }

    // ── Accessors ────────────────────────────────────────────────

    #[test]
    fn set_port_value_validates_endpoint() {
        let mut engine = Engine::new();
        engine.add_device("a", [Port::new("p", 0)], NoopController).unwrap();
        engine.set_port_value("a", "p", "hello").unwrap();
        assert_eq!(engine.port_value("a", "p"), Some(&Value::from("hello")));
        assert!(matches!(
            engine.set_port_value("a", "q", 1),
            Err(RegistrationError::UnknownEndpoint {
                fault: EndpointFault::NoSuchPort,
                ..
            })
        ));
    }

    #[test]
    fn metrics_describe_last_cycle() {
        let log = EventLog::new();
        let mut engine = Engine::new();
        engine.add_device("a", [Port::new("out", 0)], NoopController).unwrap();
        engine.add_device("b", [Port::new("in", 0)], NoopController).unwrap();
        engine.add_connection("a", "out", "b", "in").unwrap();
        engine.add_service(ProbeService::new("probe", &log)).unwrap();
        assert!(engine.last_metrics().is_none());

        engine.run_cycles(2).unwrap();
        let metrics = engine.last_metrics().unwrap();
        assert_eq!(metrics.cycle, CycleId(1));
        assert_eq!(metrics.connections, 1);
        assert_eq!(metrics.service_us.len(), 1);
        assert_eq!(metrics.service_us[0].0, "probe");
    }

    #[test]
    fn debug_lists_topology() {
        let mut engine = Engine::new();
        engine.add_device("main", [], NoopController).unwrap();
        let rendered = format!("{engine:?}");
        assert!(rendered.contains("main"));
        assert!(rendered.contains("frozen: false"));
    }
}
