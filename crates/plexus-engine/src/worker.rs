//! Cycle loop for the realtime driver.
//!
//! The worker thread owns [`Engine`] exclusively (moved in via
//! `thread::spawn`) and hands it back through `JoinHandle<WorkerExit>`.
//! Cancellation arrives on a crossbeam channel whose sender is dropped
//! by `stop()`; the loop checks it only while waiting for the next
//! deadline, never during a cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::config::{MissedCycles, RealtimeConfig};
use crate::engine::Engine;
use crate::error::CycleError;
use crate::realtime::RunReport;

/// What the worker thread returns when it exits.
pub(crate) struct WorkerExit {
    pub engine: Engine,
    pub report: RunReport,
    /// The cycle failure that ended the run, if any.
    pub failure: Option<CycleError>,
}

/// State held by the worker thread's main loop.
pub(crate) struct CycleWorker {
    engine: Engine,
    stop_rx: Receiver<()>,
    completed: Arc<AtomicU64>,
    period: Duration,
    missed_cycles: MissedCycles,
}

impl CycleWorker {
    pub fn new(
        engine: Engine,
        stop_rx: Receiver<()>,
        completed: Arc<AtomicU64>,
        config: &RealtimeConfig,
    ) -> Self {
        Self {
            engine,
            stop_rx,
            completed,
            period: config.period,
            missed_cycles: config.missed_cycles,
        }
    }

    /// Main loop. Runs until the stop channel disconnects or a cycle fails.
    ///
    /// The first cycle runs immediately. Consumes self and returns the
    /// engine so the driver can recover it.
    pub fn run(mut self) -> WorkerExit {
        let started = Instant::now();
        let mut deadline = Some(started);
        let mut cycles = 0u64;
        let mut overruns = 0u64;
        let mut failure = None;

        while self.wait_until(deadline) {
            let cycle_start = Instant::now();
            if let Err(e) = self.engine.next_cycle() {
                tracing::error!(
                    error = %e,
                    cycle = e.cycle().0,
                    "background cycle failed; worker exiting"
                );
                failure = Some(e);
                break;
            }
            cycles += 1;
            self.completed
                .store(self.engine.current_cycle().0, Ordering::Release);

            let busy = cycle_start.elapsed();
            if busy > self.period {
                overruns += 1;
                tracing::warn!(
                    cycle = self.engine.current_cycle().0 - 1,
                    busy_us = busy.as_micros() as u64,
                    period_us = self.period.as_micros() as u64,
                    "cycle overran its period"
                );
            }

            deadline = match self.missed_cycles {
                MissedCycles::Delay => cycle_start.checked_add(self.period),
                MissedCycles::Burst => deadline.and_then(|d| d.checked_add(self.period)),
            };
        }

        WorkerExit {
            engine: self.engine,
            report: RunReport {
                cycles,
                overruns,
                elapsed: started.elapsed(),
            },
            failure,
        }
    }

    /// Block until `deadline` or until stop is signalled. Returns `true`
    /// when the next cycle should run.
    ///
    /// A deadline already in the past still checks the stop channel, so a
    /// worker that has fallen behind remains stoppable. `None` means the
    /// schedule overflowed; wait for stop alone.
    fn wait_until(&self, deadline: Option<Instant>) -> bool {
        let outcome = match deadline {
            Some(deadline) => self.stop_rx.recv_deadline(deadline),
            None => self
                .stop_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };
        matches!(outcome, Err(RecvTimeoutError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_core::Port;
    use plexus_test_utils::{FailingController, Timeline, TimedController};
    use std::thread;

    fn worker(
        engine: Engine,
        period: Duration,
        policy: MissedCycles,
    ) -> (CycleWorker, crossbeam_channel::Sender<()>, Arc<AtomicU64>) {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let completed = Arc::new(AtomicU64::new(0));
        let config = RealtimeConfig::new(period).with_missed_cycles(policy);
        (
            CycleWorker::new(engine, stop_rx, Arc::clone(&completed), &config),
            stop_tx,
            completed,
        )
    }

    #[test]
    fn stop_before_first_cycle_runs_nothing() {
        let (w, stop_tx, completed) =
            worker(Engine::new(), Duration::from_millis(10), MissedCycles::Delay);
        drop(stop_tx);
        let exit = w.run();
        assert_eq!(exit.report.cycles, 0);
        assert_eq!(completed.load(Ordering::Acquire), 0);
        assert!(exit.failure.is_none());
    }

    #[test]
    fn failure_ends_run_and_returns_engine() {
        let mut engine = Engine::new();
        engine
            .add_device("bad", [Port::new("p", 0)], FailingController::new(2))
            .unwrap();
        let (w, _stop_tx, completed) =
            worker(engine, Duration::from_millis(1), MissedCycles::Delay);
        let exit = w.run();
        assert_eq!(exit.report.cycles, 2);
        assert_eq!(completed.load(Ordering::Acquire), 2);
        assert_eq!(exit.engine.current_cycle().0, 2);
        assert_eq!(exit.failure.map(|e| e.cycle().0), Some(2));
    }

    #[test]
    fn delay_policy_counts_overruns_and_keeps_starts_a_period_apart() {
        let timeline = Timeline::new();
        let mut engine = Engine::new();
        engine
            .add_device(
                "slow",
                [],
                TimedController::new(Duration::from_millis(15), &timeline),
            )
            .unwrap();
        let (w, stop_tx, _completed) =
            worker(engine, Duration::from_millis(5), MissedCycles::Delay);
        let handle = thread::spawn(move || w.run());
        thread::sleep(Duration::from_millis(100));
        drop(stop_tx);
        let exit = handle.join().unwrap();

        assert!(exit.report.cycles >= 2);
        assert_eq!(exit.report.overruns, exit.report.cycles);
        let spans = timeline.spans();
        for pair in spans.windows(2) {
            assert!(pair[1].0 >= pair[0].1, "cycles overlapped");
            let gap = pair[1].0.duration_since(pair[0].0);
            assert!(gap >= Duration::from_millis(5), "starts {gap:?} apart");
        }
    }
}
