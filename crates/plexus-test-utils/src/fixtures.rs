//! Reusable controller and service fixtures.
//!
//! - [`ProbeController`] / [`ProbeService`] record every execution into an
//!   [`EventLog`], optionally capturing a watched port's value.
//! - [`FailingController`] / [`FailingService`] fail deterministically
//!   after N successful calls.
//! - [`PanickingController`] panics at a given cycle.
//! - [`TimedController`] sleeps for a fixed duration and records its span.

use std::thread;
use std::time::{Duration, Instant};

use plexus_core::{
    ClientsMut, Connection, Controller, CycleContext, CycleId, Endpoint, ExecuteError, PortsMut,
    Service, Value,
};

use crate::{CallCounter, Event, EventLog, Phase, Timeline};

/// Records each execution, with the value of `watch` if set.
pub struct ProbeController {
    pub name: String,
    pub watch: Option<String>,
    log: EventLog,
}

impl ProbeController {
    pub fn new(name: impl Into<String>, log: &EventLog) -> Self {
        Self {
            name: name.into(),
            watch: None,
            log: log.clone(),
        }
    }

    /// Capture the value of `port` on every execution.
    pub fn watching(mut self, port: impl Into<String>) -> Self {
        self.watch = Some(port.into());
        self
    }
}

impl Controller for ProbeController {
    fn execute(&mut self, ports: PortsMut<'_>, ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        let observed = match &self.watch {
            Some(port) => ports.require(port)?.value().clone(),
            None => Value::None,
        };
        self.log.push(Event {
            cycle: ctx.cycle(),
            unit: self.name.clone(),
            phase: Phase::Controller,
            observed,
        });
        Ok(())
    }
}

/// Records each execution, with the value of `watch` if set.
pub struct ProbeService {
    pub name: String,
    pub watch: Option<Endpoint>,
    log: EventLog,
}

impl ProbeService {
    pub fn new(name: impl Into<String>, log: &EventLog) -> Self {
        Self {
            name: name.into(),
            watch: None,
            log: log.clone(),
        }
    }

    /// Capture the value of `client.port` on every execution.
    pub fn watching(mut self, client: impl Into<String>, port: impl Into<String>) -> Self {
        self.watch = Some(Endpoint::new(client, port));
        self
    }
}

impl Service for ProbeService {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &mut self,
        clients: ClientsMut<'_>,
        _connections: &[Connection],
        ctx: &mut CycleContext<'_>,
    ) -> Result<(), ExecuteError> {
        let observed = match &self.watch {
            Some(ep) => clients
                .port_value(&ep.client, &ep.port)
                .cloned()
                .ok_or_else(|| ExecuteError::MissingPort {
                    port: ep.to_string(),
                })?,
            None => Value::None,
        };
        self.log.push(Event {
            cycle: ctx.cycle(),
            unit: self.name.clone(),
            phase: Phase::Service,
            observed,
        });
        Ok(())
    }
}

/// Succeeds `succeed_count` times, then fails on every call.
pub struct FailingController {
    pub succeed_count: u64,
    calls: CallCounter,
}

impl FailingController {
    pub fn new(succeed_count: u64) -> Self {
        Self {
            succeed_count,
            calls: CallCounter::new(),
        }
    }

    /// Handle to the call counter, readable after the controller is moved.
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl Controller for FailingController {
    fn execute(&mut self, _ports: PortsMut<'_>, _ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        let n = self.calls.bump();
        if n > self.succeed_count {
            return Err(ExecuteError::failed(format!(
                "deliberate failure after {} successful calls",
                self.succeed_count
            )));
        }
        Ok(())
    }
}

/// Service counterpart of [`FailingController`].
pub struct FailingService {
    pub name: String,
    pub succeed_count: u64,
    calls: CallCounter,
}

impl FailingService {
    pub fn new(name: impl Into<String>, succeed_count: u64) -> Self {
        Self {
            name: name.into(),
            succeed_count,
            calls: CallCounter::new(),
        }
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl Service for FailingService {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &mut self,
        _clients: ClientsMut<'_>,
        _connections: &[Connection],
        _ctx: &mut CycleContext<'_>,
    ) -> Result<(), ExecuteError> {
        let n = self.calls.bump();
        if n > self.succeed_count {
            return Err(ExecuteError::failed(format!(
                "deliberate failure after {} successful calls",
                self.succeed_count
            )));
        }
        Ok(())
    }
}

/// Panics when executed during `at`.
pub struct PanickingController {
    pub at: CycleId,
}

impl PanickingController {
    pub fn new(at: u64) -> Self {
        Self { at: CycleId(at) }
    }
}

impl Controller for PanickingController {
    fn execute(&mut self, _ports: PortsMut<'_>, ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        if ctx.cycle() == self.at {
            panic!("deliberate panic in cycle {}", self.at);
        }
        Ok(())
    }
}

/// Sleeps for `busy` on every call and records the span in a [`Timeline`].
pub struct TimedController {
    pub busy: Duration,
    timeline: Timeline,
}

impl TimedController {
    pub fn new(busy: Duration, timeline: &Timeline) -> Self {
        Self {
            busy,
            timeline: timeline.clone(),
        }
    }
}

impl Controller for TimedController {
    fn execute(&mut self, _ports: PortsMut<'_>, _ctx: &mut CycleContext<'_>) -> Result<(), ExecuteError> {
        let start = Instant::now();
        thread::sleep(self.busy);
        self.timeline.record(start, Instant::now());
        Ok(())
    }
}
