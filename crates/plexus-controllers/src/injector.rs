//! Table-driven port values across the whole topology.

use indexmap::IndexMap;
use plexus_core::{ClientsMut, Connection, CycleContext, Endpoint, ExecuteError, Service};

use crate::series::TimeSeries;

/// Service setting arbitrary `client.port` values from [`TimeSeries`].
///
/// Runs in the service phase, before propagation, so injected values
/// reach connected ports in the same cycle. Unknown clients or ports fail
/// the cycle with [`ExecuteError::MissingClient`] or
/// [`ExecuteError::MissingPort`].
#[derive(Clone, Debug)]
pub struct SeriesInjector {
    name: String,
    series: IndexMap<Endpoint, TimeSeries>,
}

impl Default for SeriesInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesInjector {
    /// An injector with no series, named `series-injector`.
    pub fn new() -> Self {
        Self::named("series-injector")
    }

    /// An injector with a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: IndexMap::new(),
        }
    }

    /// Add or replace the series driving `client.port`.
    pub fn with_series(
        mut self,
        client: impl Into<String>,
        port: impl Into<String>,
        series: TimeSeries,
    ) -> Self {
        self.series.insert(Endpoint::new(client, port), series);
        self
    }

    /// Number of driven ports.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether no ports are driven.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Service for SeriesInjector {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &mut self,
        mut clients: ClientsMut<'_>,
        _connections: &[Connection],
        ctx: &mut CycleContext<'_>,
    ) -> Result<(), ExecuteError> {
        for (endpoint, series) in &self.series {
            clients.set(
                &endpoint.client,
                &endpoint.port,
                series.get(ctx.cycle()).clone(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_core::{Client, Clients, CycleId, Port, Ports, UserData, Value};

    fn clients() -> Clients {
        let mut clients = Clients::new();
        let ports = Ports::from_ports([Port::new("level", 0)]).unwrap();
        clients.insert(Client::new("tank", ports)).unwrap();
        clients
    }

    fn run(injector: &mut SeriesInjector, clients: &mut Clients, cycle: u64) -> Result<(), ExecuteError> {
        let mut user = UserData::new();
        injector.execute(
            ClientsMut::new(clients),
            &[],
            &mut CycleContext::new(CycleId(cycle), &mut user),
        )
    }

    #[test]
    fn injects_value_for_current_cycle() {
        let mut injector = SeriesInjector::new()
            .with_series("tank", "level", TimeSeries::new([(0, 10), (2, 20)]).unwrap());
        let mut clients = clients();
        run(&mut injector, &mut clients, 1).unwrap();
        assert_eq!(clients.port_value("tank", "level"), Some(&Value::Int(10)));
        run(&mut injector, &mut clients, 2).unwrap();
        assert_eq!(clients.port_value("tank", "level"), Some(&Value::Int(20)));
        assert_eq!(injector.name(), "series-injector");
    }

    #[test]
    fn unknown_targets_fail() {
        let mut clients = clients();
        let mut no_client = SeriesInjector::new().with_series("pump", "level", TimeSeries::constant(1));
        assert_eq!(
            run(&mut no_client, &mut clients, 0),
            Err(ExecuteError::MissingClient {
                client: "pump".to_string()
            })
        );
        let mut no_port = SeriesInjector::named("bad").with_series("tank", "flow", TimeSeries::constant(1));
        assert_eq!(
            run(&mut no_port, &mut clients, 0),
            Err(ExecuteError::MissingPort {
                port: "flow".to_string()
            })
        );
    }
}
