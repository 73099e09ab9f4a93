//! Integration test: periodic driver timing and lifecycle.
//!
//! Timing assertions use generous bounds; they check the schedule shape
//! (first cycle immediate, roughly one cycle per period, no overlap), not
//! precise latencies.

use std::thread;
use std::time::{Duration, Instant};

use plexus_controllers::NoopController;
use plexus_core::Port;
use plexus_engine::{Engine, MissedCycles, RealtimeConfig, RealtimeEngine, RealtimePhase};
use plexus_test_utils::{Timeline, TimedController};

fn engine_with_noop() -> Engine {
    let mut engine = Engine::new();
    engine
        .add_device("n", [Port::new("p", 0)], NoopController)
        .unwrap();
    engine
}

#[test]
fn runs_about_one_cycle_per_period() {
    let mut driver = RealtimeEngine::with_period_secs(engine_with_noop(), 0.05).unwrap();
    driver.start().unwrap();
    thread::sleep(Duration::from_millis(225));
    driver.stop().unwrap();
    let report = driver.join().unwrap();

    // Cycles at 0, 50, 100, 150, 200 ms: nominally 5 with an immediate
    // first cycle; allow scheduler noise either way.
    assert!(
        (3..=6).contains(&report.cycles),
        "expected ~5 cycles, got {}",
        report.cycles
    );
    assert_eq!(driver.engine().unwrap().current_cycle().0, report.cycles);
    assert_eq!(report.overruns, 0);
}

#[test]
fn stop_does_not_block_and_join_waits_for_cycle_in_progress() {
    let timeline = Timeline::new();
    let mut engine = Engine::new();
    engine
        .add_device(
            "slow",
            [],
            TimedController::new(Duration::from_millis(80), &timeline),
        )
        .unwrap();
    let mut driver =
        RealtimeEngine::new(engine, RealtimeConfig::new(Duration::from_millis(10))).unwrap();
    driver.start().unwrap();
    thread::sleep(Duration::from_millis(20));

    let before_stop = Instant::now();
    driver.stop().unwrap();
    assert!(before_stop.elapsed() < Duration::from_millis(40));
    assert_eq!(driver.phase(), RealtimePhase::Stopping);

    let report = driver.join().unwrap();
    // The cycle that was running when stop was requested completed.
    let spans = timeline.spans();
    assert_eq!(spans.len() as u64, report.cycles);
    assert!(report.cycles >= 1);
    let (_, last_end) = spans[spans.len() - 1];
    assert!(last_end <= Instant::now());
}

#[test]
fn cycles_never_overlap_under_either_policy() {
    for policy in [MissedCycles::Delay, MissedCycles::Burst] {
        let timeline = Timeline::new();
        let mut engine = Engine::new();
        engine
            .add_device(
                "busy",
                [],
                TimedController::new(Duration::from_millis(12), &timeline),
            )
            .unwrap();
        let config = RealtimeConfig::new(Duration::from_millis(5)).with_missed_cycles(policy);
        let mut driver = RealtimeEngine::new(engine, config).unwrap();
        driver.start().unwrap();
        thread::sleep(Duration::from_millis(120));
        driver.stop().unwrap();
        let report = driver.join().unwrap();

        let spans = timeline.spans();
        assert_eq!(spans.len() as u64, report.cycles);
        for pair in spans.windows(2) {
            assert!(pair[1].0 >= pair[0].1, "{policy:?}: cycles overlapped");
        }
        assert_eq!(report.overruns, report.cycles, "{policy:?}");
    }
}

#[test]
fn delay_policy_spaces_cycle_starts_by_at_least_one_period() {
    let timeline = Timeline::new();
    let mut engine = Engine::new();
    engine
        .add_device(
            "tick",
            [],
            TimedController::new(Duration::from_millis(1), &timeline),
        )
        .unwrap();
    let period = Duration::from_millis(20);
    let mut driver = RealtimeEngine::new(engine, RealtimeConfig::new(period)).unwrap();
    driver.start().unwrap();
    thread::sleep(Duration::from_millis(130));
    driver.stop().unwrap();
    driver.join().unwrap();

    let spans = timeline.spans();
    assert!(spans.len() >= 3);
    for pair in spans.windows(2) {
        // Controller start trails cycle start by a few microseconds at most.
        let gap = pair[1].0.duration_since(pair[0].0);
        assert!(gap + Duration::from_millis(1) >= period, "gap {gap:?}");
    }
}

#[test]
fn completed_cycles_is_live_while_running() {
    let mut driver = RealtimeEngine::new(
        engine_with_noop(),
        RealtimeConfig::new(Duration::from_millis(2)),
    )
    .unwrap();
    assert_eq!(driver.completed_cycles(), 0);
    driver.start().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while seen.len() < 3 {
        assert!(Instant::now() < deadline, "counter did not advance");
        let now = driver.completed_cycles();
        if seen.last() != Some(&now) {
            seen.push(now);
        }
        thread::sleep(Duration::from_millis(1));
    }
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    driver.stop().unwrap();
    driver.join().unwrap();
}
