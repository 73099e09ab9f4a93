//! Test utilities and probe units for Plexus development.
//!
//! Provides shared recording handles ([`EventLog`], [`Timeline`],
//! [`CallCounter`]) that stay readable after the units holding them have
//! been moved into an engine, plus the probe and failure-injection units
//! in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use plexus_core::{CycleId, Value};

pub use fixtures::{
    FailingController, FailingService, PanickingController, ProbeController, ProbeService,
    TimedController,
};

/// Which cycle phase produced an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Service,
    Controller,
}

/// One unit execution, as seen by a probe.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub cycle: CycleId,
    pub unit: String,
    pub phase: Phase,
    /// Value of the watched port at the time the unit ran, or
    /// [`Value::None`] when the probe watches nothing.
    pub observed: Value,
}

/// Append-only, cloneable log of [`Event`]s shared between probes.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        lock(&self.inner).push(event);
    }

    /// Copy of every event recorded so far.
    pub fn events(&self) -> Vec<Event> {
        lock(&self.inner).clone()
    }

    /// Unit names in execution order.
    pub fn units(&self) -> Vec<String> {
        lock(&self.inner).iter().map(|e| e.unit.clone()).collect()
    }

    /// Unit names executed during `cycle`, in execution order.
    pub fn units_in(&self, cycle: CycleId) -> Vec<String> {
        lock(&self.inner)
            .iter()
            .filter(|e| e.cycle == cycle)
            .map(|e| e.unit.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.inner).clear();
    }
}

/// Shared list of `(start, end)` execution spans.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    inner: Arc<Mutex<Vec<(Instant, Instant)>>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, start: Instant, end: Instant) {
        lock(&self.inner).push((start, end));
    }

    pub fn spans(&self) -> Vec<(Instant, Instant)> {
        lock(&self.inner).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).is_empty()
    }
}

/// Shared execution counter.
#[derive(Clone, Debug, Default)]
pub struct CallCounter {
    inner: Arc<AtomicU64>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}

// A panicking probe poisons the mutex; the data is still valid for tests.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
