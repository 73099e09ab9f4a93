//! Benchmark topologies for the Plexus cycle simulation framework.
//!
//! Provides pre-built [`Engine`] profiles for benchmarking:
//!
//! - [`chain_profile`]: `n` clients wired in a line, one connection each
//! - [`fanout_profile`]: one source broadcasting to `n` sinks
//! - [`service_profile`]: a chain plus `n` services at mixed priorities

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use plexus_controllers::{controller_fn, service_fn, NoopController};
use plexus_core::{Port, Value};
use plexus_engine::{Engine, RegistrationError};

/// Build a chain of `n` clients. Each adds one to its input and passes it on.
///
/// Client `i` is named `c{i}`; connection `c{i}.out -> c{i+1}.in`.
pub fn chain_profile(n: usize) -> Result<Engine, RegistrationError> {
    let mut engine = Engine::new();
    for i in 0..n {
        engine.add_device(
            format!("c{i}"),
            [Port::new("in", 0), Port::new("out", 0)],
            controller_fn(|mut ports, _ctx| {
                let input = ports.require("in")?.value().as_int()?;
                ports.set("out", input.wrapping_add(1))
            }),
        )?;
    }
    for i in 1..n {
        engine.add_connection(&format!("c{}", i - 1), "out", &format!("c{i}"), "in")?;
    }
    Ok(engine)
}

/// Build one source client whose `out` port feeds `n` sinks.
///
/// The source carries a list value so every propagation copies heap data.
pub fn fanout_profile(n: usize, payload_len: usize) -> Result<Engine, RegistrationError> {
    let mut engine = Engine::new();
    let payload = Value::List((0..payload_len as i64).map(Value::Int).collect());
    engine.add_device("source", [Port::new("out", payload)], NoopController)?;
    for i in 0..n {
        engine.add_device(format!("sink{i}"), [Port::empty("in")], NoopController)?;
        engine.add_connection("source", "out", &format!("sink{i}"), "in")?;
    }
    Ok(engine)
}

/// Build a [`chain_profile`] of `clients` clients plus `services` services.
///
/// Priorities cycle through `-1, 0, 1` so registration exercises ordered
/// insertion. Each service bumps the head of the chain.
pub fn service_profile(clients: usize, services: usize) -> Result<Engine, RegistrationError> {
    let mut engine = chain_profile(clients)?;
    for i in 0..services {
        let priority = (i % 3) as i32 - 1;
        engine.add_service_with_priority(
            service_fn(format!("s{i}"), |mut clients, _connections, _ctx| {
                if let Some(value) = clients.value_mut("c0", "in") {
                    let next = value.as_int().unwrap_or(0).wrapping_add(1);
                    *value = Value::Int(next);
                }
                Ok(())
            }),
            priority,
        )?;
    }
    Ok(engine)
}
