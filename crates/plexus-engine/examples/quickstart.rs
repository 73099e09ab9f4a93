//! Plexus Quickstart: a complete, minimal cycle simulation.
//!
//! Demonstrates:
//!   1. Declaring clients with ports and a controller each
//!   2. Wiring ports together with connections
//!   3. Adding a prioritized service
//!   4. Stepping cycles by hand and reading port values and metrics
//!
//! Run with:
//!   cargo run --example quickstart

use plexus_controllers::{controller_fn, service_fn, LookupTable, Recorder, TimeSeries};
use plexus_core::{Port, Value};
use plexus_engine::Engine;

// ─── Topology ───────────────────────────────────────────────────
//
//   lookup.values ──► main.in      main.out ──► recorder.capture
//
// `lookup` replays a table of inputs, `main` adds two to whatever
// arrived on its input, and `recorder` keeps every value it sees.
// A service caps `main.out` at 6 before propagation runs, so the
// recorder sees the capped value.

const CYCLES: u64 = 6;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut engine = Engine::new();

    // 1. Clients. Controllers run in this registration order.
    engine.add_device(
        "main",
        [Port::new("in", 0), Port::empty("out")],
        controller_fn(|mut ports, ctx| {
            let input = ports.require("in")?.value().as_int()?;
            ports.set("out", input + 2)?;
            ctx.user_mut()
                .insert("last_sum".into(), Value::Int(input + 2));
            Ok(())
        }),
    )?;
    engine.add_device(
        "lookup",
        [Port::new("values", 0)],
        LookupTable::new().with_series("values", TimeSeries::new([(0, 3), (1, 4), (2, 5)])?),
    )?;
    let recorder = Recorder::new();
    let history = recorder.history();
    engine.add_device("recorder", [Port::empty("capture")], recorder)?;

    // 2. Connections. Propagation copies source to target every cycle.
    engine.add_connection("lookup", "values", "main", "in")?;
    engine.add_connection("main", "out", "recorder", "capture")?;

    // 3. A service sees every client and runs before propagation.
    engine.add_service_with_priority(
        service_fn("cap", |mut clients, _connections, _ctx| {
            let out = clients.require_value_mut("main", "out")?;
            if matches!(out.as_int(), Ok(v) if v > 6) {
                *out = Value::Int(6);
            }
            Ok(())
        }),
        10,
    )?;

    // 4. Step.
    println!("cycle | main.in | main.out | recorder.capture");
    for _ in 0..CYCLES {
        engine.next_cycle()?;
        println!(
            "{:>5} | {:>7} | {:>8} | {}",
            engine.current_cycle(),
            show(engine.port_value("main", "in")),
            show(engine.port_value("main", "out")),
            show(engine.port_value("recorder", "capture")),
        );
    }

    if let Some(metrics) = engine.last_metrics() {
        println!(
            "\nlast cycle: {}us total, {}us in services, {}us propagating {} connections, {}us in controllers",
            metrics.total_us,
            metrics.services_total_us(),
            metrics.propagation_us,
            metrics.connections,
            metrics.controller_us,
        );
    }

    let captured = history.port("capture").unwrap_or_default();
    println!("recorded: {captured:?}");
    println!(
        "user data: last_sum = {}",
        show(engine.state().user().get("last_sum"))
    );
    Ok(())
}

fn show(value: Option<&Value>) -> String {
    value.map_or_else(|| "-".to_string(), Value::to_string)
}
