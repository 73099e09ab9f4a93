//! Periodic driver running an [`Engine`] on a background thread.
//!
//! # Architecture
//!
//! ```text
//! Caller                          Cycle worker ("plexus-cycle")
//!   |                                 |
//!   |--start()--spawn(engine)-------->| loop:
//!   |                                 |   stop_rx.recv_deadline(next)
//!   |                                 |   engine.next_cycle()
//!   |<--completed_cycles() (atomic)---|   completed.store(cycle)
//!   |                                 |
//!   |--stop(): drop(stop_tx)--------->| recv_deadline -> Disconnected
//!   |                                 | return WorkerExit { engine, .. }
//!   |--join(): handle.join()<---------|
//! ```
//!
//! # Lifecycle
//!
//! `Idle -> Running -> Stopping -> Stopped`, and `Stopped -> Running`
//! again on restart. While the worker runs it owns the engine; the driver
//! gets it back from `join()`.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::config::{ConfigError, RealtimeConfig};
use crate::engine::Engine;
use crate::error::RealtimeError;
use crate::worker::{CycleWorker, WorkerExit};

// ── RunReport ────────────────────────────────────────────────────

/// Summary of one background run, returned by
/// [`RealtimeEngine::join()`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Cycles completed during this run.
    pub cycles: u64,
    /// Cycles whose execution took longer than the period.
    pub overruns: u64,
    /// Wall-clock time from worker start to worker exit.
    pub elapsed: Duration,
}

// ── RealtimePhase ────────────────────────────────────────────────

/// Lifecycle phase of a [`RealtimeEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RealtimePhase {
    /// Never started.
    Idle,
    /// The worker is driving cycles.
    Running,
    /// Stop requested; the worker may still be finishing a cycle.
    Stopping,
    /// The worker has been joined.
    Stopped,
}

// ── RealtimeEngine ───────────────────────────────────────────────

/// Drives an [`Engine`] at a fixed period on a dedicated thread.
///
/// Cycles never overlap: the worker calls
/// [`next_cycle()`](Engine::next_cycle) in a loop and only waits between
/// calls. The period is a target; under load cycles start late rather
/// than concurrently.
///
/// Dropping a running driver stops and joins the worker.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use plexus_engine::{Engine, RealtimeEngine};
///
/// let mut driver = RealtimeEngine::with_period_secs(Engine::new(), 0.05).unwrap();
/// driver.start().unwrap();
/// std::thread::sleep(Duration::from_millis(225));
/// driver.stop().unwrap();
/// let report = driver.join().unwrap();
/// println!("ran {} cycles", report.cycles);
/// ```
pub struct RealtimeEngine {
    config: RealtimeConfig,
    /// Present whenever the worker is not running.
    engine: Option<Engine>,
    phase: RealtimePhase,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<WorkerExit>>,
    completed: Arc<AtomicU64>,
}

impl RealtimeEngine {
    /// Wrap `engine` with a validated configuration. Nothing runs until
    /// [`start()`](RealtimeEngine::start).
    pub fn new(engine: Engine, config: RealtimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let completed = Arc::new(AtomicU64::new(engine.current_cycle().0));
        Ok(Self {
            config,
            engine: Some(engine),
            phase: RealtimePhase::Idle,
            stop_tx: None,
            worker: None,
            completed,
        })
    }

    /// Wrap `engine` with a period in seconds and default settings.
    pub fn with_period_secs(engine: Engine, secs: f64) -> Result<Self, ConfigError> {
        Self::new(engine, RealtimeConfig::from_secs_f64(secs)?)
    }

    /// Start the background worker. The first cycle runs immediately.
    ///
    /// Also restarts a driver that has been stopped and joined, continuing
    /// from the engine's current cycle.
    ///
    /// # Errors
    ///
    /// - [`RealtimeError::AlreadyRunning`] while running or stopping.
    /// - [`RealtimeError::EngineUnavailable`] if the engine was lost.
    /// - [`RealtimeError::Spawn`] if the thread could not be created. The
    ///   engine is lost in that case.
    pub fn start(&mut self) -> Result<(), RealtimeError> {
        if matches!(
            self.phase,
            RealtimePhase::Running | RealtimePhase::Stopping
        ) {
            return Err(RealtimeError::AlreadyRunning);
        }
        let engine = self.engine.take().ok_or(RealtimeError::EngineUnavailable)?;

        // Never sent on: dropping the sender is the stop signal.
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        self.completed
            .store(engine.current_cycle().0, Ordering::Release);
        let from_cycle = engine.current_cycle().0;
        let worker = CycleWorker::new(
            engine,
            stop_rx,
            Arc::clone(&self.completed),
            &self.config,
        );

        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || worker.run())
            .map_err(RealtimeError::Spawn)?;

        self.stop_tx = Some(stop_tx);
        self.worker = Some(handle);
        self.phase = RealtimePhase::Running;
        tracing::info!(
            period_us = self.config.period.as_micros() as u64,
            thread = %self.config.thread_name,
            from_cycle,
            "realtime engine started"
        );
        Ok(())
    }

    /// Request the worker to stop. Does not block.
    ///
    /// A cycle in progress completes; no further cycle starts.
    ///
    /// # Errors
    ///
    /// [`RealtimeError::NotRunning`] unless the driver is running.
    pub fn stop(&mut self) -> Result<(), RealtimeError> {
        if self.phase != RealtimePhase::Running {
            return Err(RealtimeError::NotRunning);
        }
        drop(self.stop_tx.take());
        self.phase = RealtimePhase::Stopping;
        tracing::info!(
            completed = self.completed_cycles(),
            "realtime engine stop requested"
        );
        Ok(())
    }

    /// Block until the worker exits and recover the engine.
    ///
    /// # Errors
    ///
    /// - [`RealtimeError::StopNotRequested`] while running; call
    ///   [`stop()`](RealtimeEngine::stop) first.
    /// - [`RealtimeError::NotRunning`] if there is no worker to join.
    /// - [`RealtimeError::Cycle`] if a background cycle failed. The engine
    ///   is still recovered.
    /// - [`RealtimeError::WorkerPanicked`] if a unit panicked. The engine
    ///   is lost.
    pub fn join(&mut self) -> Result<RunReport, RealtimeError> {
        match self.phase {
            RealtimePhase::Running => return Err(RealtimeError::StopNotRequested),
            RealtimePhase::Idle | RealtimePhase::Stopped => return Err(RealtimeError::NotRunning),
            RealtimePhase::Stopping => {}
        }
        let handle = self.worker.take().ok_or(RealtimeError::NotRunning)?;
        self.phase = RealtimePhase::Stopped;

        let exit = handle.join().map_err(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(%message, "cycle worker panicked");
            RealtimeError::WorkerPanicked { message }
        })?;

        self.completed
            .store(exit.engine.current_cycle().0, Ordering::Release);
        self.engine = Some(exit.engine);
        tracing::info!(
            cycles = exit.report.cycles,
            overruns = exit.report.overruns,
            elapsed_ms = exit.report.elapsed.as_millis() as u64,
            "realtime engine joined"
        );
        match exit.failure {
            Some(e) => Err(RealtimeError::Cycle(e)),
            None => Ok(exit.report),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RealtimePhase {
        self.phase
    }

    /// Whether the worker thread has exited, either because stop was
    /// requested or because a cycle failed. `false` when no worker exists.
    pub fn is_worker_finished(&self) -> bool {
        self.worker.as_ref().is_some_and(JoinHandle::is_finished)
    }

    /// The engine's cycle counter, updated by the worker after every
    /// completed cycle. Lock-free.
    pub fn completed_cycles(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// The driver configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// The engine, unless the worker currently owns it or it was lost.
    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    /// Mutable engine access between runs.
    pub fn engine_mut(&mut self) -> Option<&mut Engine> {
        self.engine.as_mut()
    }

    /// Shut the driver down and return the engine.
    ///
    /// A running worker is stopped and joined first. A background cycle
    /// failure found by that join is logged and the engine is still
    /// returned; call [`join()`](RealtimeEngine::join) yourself to
    /// handle it.
    pub fn into_engine(mut self) -> Result<Engine, RealtimeError> {
        self.shutdown()?;
        self.engine.take().ok_or(RealtimeError::EngineUnavailable)
    }

    fn shutdown(&mut self) -> Result<(), RealtimeError> {
        if self.phase == RealtimePhase::Running {
            self.stop()?;
        }
        if self.phase == RealtimePhase::Stopping {
            match self.join() {
                Ok(_) => {}
                Err(RealtimeError::Cycle(e)) => {
                    tracing::warn!(
                        error = %e,
                        "discarding background cycle failure on shutdown"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("phase", &self.phase)
            .field("period", &self.config.period)
            .field("completed_cycles", &self.completed_cycles())
            .finish_non_exhaustive()
    }
}

impl Drop for RealtimeEngine {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "realtime engine shutdown on drop failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_controllers::NoopController;
    use plexus_core::Port;
    use plexus_test_utils::{FailingController, PanickingController};
    use std::time::Instant;

    fn wait_for(driver: &RealtimeEngine, cycles: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while driver.completed_cycles() < cycles {
            assert!(Instant::now() < deadline, "worker made no progress");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn wait_finished(driver: &RealtimeEngine) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !driver.is_worker_finished() {
            assert!(Instant::now() < deadline, "worker did not exit");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn fast_driver(engine: Engine) -> RealtimeEngine {
        RealtimeEngine::new(engine, RealtimeConfig::new(Duration::from_millis(1))).unwrap()
    }

    #[test]
    fn rejects_invalid_period() {
        assert!(matches!(
            RealtimeEngine::with_period_secs(Engine::new(), 0.0),
            Err(ConfigError::InvalidPeriod { .. })
        ));
        assert!(matches!(
            RealtimeEngine::with_period_secs(Engine::new(), f64::NAN),
            Err(ConfigError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn lifecycle_start_stop_join() {
        let mut driver = fast_driver(Engine::new());
        assert_eq!(driver.phase(), RealtimePhase::Idle);
        assert!(driver.engine().is_some());

        driver.start().unwrap();
        assert_eq!(driver.phase(), RealtimePhase::Running);
        assert!(driver.engine().is_none());
        wait_for(&driver, 3);

        driver.stop().unwrap();
        assert_eq!(driver.phase(), RealtimePhase::Stopping);
        let report = driver.join().unwrap();
        assert_eq!(driver.phase(), RealtimePhase::Stopped);
        assert!(report.cycles >= 3);

        let engine = driver.engine().unwrap();
        assert_eq!(engine.current_cycle().0, report.cycles);
        assert_eq!(driver.completed_cycles(), report.cycles);
    }

    #[test]
    fn misuse_is_reported() {
        let mut driver = fast_driver(Engine::new());
        assert!(matches!(driver.stop(), Err(RealtimeError::NotRunning)));
        assert!(matches!(driver.join(), Err(RealtimeError::NotRunning)));

        driver.start().unwrap();
        assert!(matches!(driver.start(), Err(RealtimeError::AlreadyRunning)));
        assert!(matches!(driver.join(), Err(RealtimeError::StopNotRequested)));

        driver.stop().unwrap();
        assert!(matches!(driver.stop(), Err(RealtimeError::NotRunning)));
        assert!(matches!(driver.start(), Err(RealtimeError::AlreadyRunning)));

        driver.join().unwrap();
        assert!(matches!(driver.join(), Err(RealtimeError::NotRunning)));
    }

    #[test]
    fn restart_continues_from_recovered_engine() {
        let mut driver = fast_driver(Engine::new());
        driver.start().unwrap();
        wait_for(&driver, 2);
        driver.stop().unwrap();
        let first = driver.join().unwrap();

        driver.start().unwrap();
        wait_for(&driver, first.cycles + 2);
        driver.stop().unwrap();
        let second = driver.join().unwrap();

        let total = driver.engine().unwrap().current_cycle().0;
        assert_eq!(total, first.cycles + second.cycles);
    }

    #[test]
    fn cycle_failure_surfaces_from_join() {
        let mut engine = Engine::new();
        engine
            .add_device("bad", [Port::new("p", 0)], FailingController::new(2))
            .unwrap();
        let mut driver = fast_driver(engine);
        driver.start().unwrap();
        wait_finished(&driver);
        driver.stop().unwrap();

        let err = driver.join().unwrap_err();
        match err {
            RealtimeError::Cycle(e) => assert_eq!(e.cycle().0, 2),
            other => panic!("unexpected error: {other}"),
        }
        // The engine survives a unit failure.
        assert_eq!(driver.engine().unwrap().current_cycle().0, 2);
    }

    #[test]
    fn panic_surfaces_from_join_and_loses_engine() {
        let mut engine = Engine::new();
        engine
            .add_device("boom", [], PanickingController::new(1))
            .unwrap();
        let mut driver = fast_driver(engine);
        driver.start().unwrap();
        wait_finished(&driver);
        driver.stop().unwrap();

        match driver.join() {
            Err(RealtimeError::WorkerPanicked { message }) => {
                assert!(message.contains("deliberate panic"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(driver.engine().is_none());
        assert!(matches!(driver.start(), Err(RealtimeError::EngineUnavailable)));
    }

    #[test]
    fn into_engine_stops_running_worker() {
        let mut engine = Engine::new();
        engine.add_device("n", [], NoopController).unwrap();
        let mut driver = fast_driver(engine);
        driver.start().unwrap();
        wait_for(&driver, 1);
        let engine = driver.into_engine().unwrap();
        assert!(engine.current_cycle().0 >= 1);
    }

    #[test]
    fn worker_thread_uses_configured_name() {
        let names = plexus_test_utils::EventLog::new();
        let mut engine = Engine::new();
        let log = names.clone();
        engine
            .add_device(
                "namer",
                [],
                plexus_controllers::controller_fn(move |_ports, ctx| {
                    log.push(plexus_test_utils::Event {
                        cycle: ctx.cycle(),
                        unit: thread::current().name().unwrap_or("").to_string(),
                        phase: plexus_test_utils::Phase::Controller,
                        observed: plexus_core::Value::None,
                    });
                    Ok(())
                }),
            )
            .unwrap();
        let config = RealtimeConfig::new(Duration::from_millis(1)).with_thread_name("sim-worker");
        let mut driver = RealtimeEngine::new(engine, config).unwrap();
        driver.start().unwrap();
        wait_for(&driver, 1);
        driver.stop().unwrap();
        driver.join().unwrap();
        assert_eq!(names.units()[0], "sim-worker");
    }

    #[test]
    fn drop_stops_running_worker() {
        let mut driver = fast_driver(Engine::new());
        driver.start().unwrap();
        wait_for(&driver, 1);
        drop(driver);
    }
}
