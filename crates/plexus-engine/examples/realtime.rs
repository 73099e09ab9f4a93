//! Plexus Realtime: drive an engine on a background thread at a fixed
//! period, stop it, and take the engine back.
//!
//! Demonstrates:
//!   1. Building a RealtimeConfig (period, thread name, missed-cycle policy)
//!   2. start / stop / join on RealtimeEngine
//!   3. Watching progress through completed_cycles() while running
//!   4. Recovering the engine and inspecting its final state
//!
//! Run with:
//!   RUST_LOG=plexus_engine=debug cargo run --example realtime

use std::thread;
use std::time::Duration;

use plexus_controllers::{controller_fn, Recorder};
use plexus_core::Port;
use plexus_engine::{Engine, MissedCycles, RealtimeConfig, RealtimeEngine};

// ─── Parameters ─────────────────────────────────────────────────

const PERIOD: Duration = Duration::from_millis(20);
const RUN_FOR: Duration = Duration::from_millis(250);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();

    // 1. A counter feeding a recorder.
    let mut engine = Engine::new();
    engine.add_device(
        "counter",
        [Port::new("count", 0)],
        controller_fn(|mut ports, _ctx| {
            let next = ports.require("count")?.value().as_int()? + 1;
            ports.set("count", next)
        }),
    )?;
    let recorder = Recorder::new();
    let history = recorder.history();
    engine.add_device("recorder", [Port::empty("seen")], recorder)?;
    engine.add_connection("counter", "count", "recorder", "seen")?;

    // 2. Configure and start. The first cycle runs immediately.
    let config = RealtimeConfig::new(PERIOD)
        .with_thread_name("counter-sim")
        .with_missed_cycles(MissedCycles::Delay);
    let mut driver = RealtimeEngine::new(engine, config)?;
    driver.start()?;
    println!("started: {:?}, period {:?}", driver.phase(), PERIOD);

    // 3. Observe progress from the caller's thread.
    let step = RUN_FOR / 5;
    for _ in 0..5 {
        thread::sleep(step);
        println!("  completed cycles: {}", driver.completed_cycles());
    }

    // 4. Stop returns at once; join waits for the cycle in progress.
    driver.stop()?;
    let report = driver.join()?;
    println!(
        "stopped after {} cycles in {:?} ({} overran the period)",
        report.cycles, report.elapsed, report.overruns
    );

    let engine = driver.into_engine()?;
    println!(
        "engine at cycle {}, counter = {}",
        engine.current_cycle(),
        engine
            .port_value("counter", "count")
            .map_or_else(|| "-".to_string(), ToString::to_string)
    );
    println!("recorder saw {} values", history.port_len("seen"));
    Ok(())
}
