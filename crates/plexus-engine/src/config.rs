//! Periodic driver configuration, validation, and error types.
//!
//! [`RealtimeConfig`] is the construction input for a
//! [`RealtimeEngine`](crate::RealtimeEngine).
//! [`validate()`](RealtimeConfig::validate) checks it before any thread
//! is spawned.

use std::time::Duration;

/// Name given to the background cycle thread unless overridden.
pub const DEFAULT_THREAD_NAME: &str = "plexus-cycle";

// ── MissedCycles ───────────────────────────────────────────────────

/// What the driver does when a cycle runs past its period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissedCycles {
    /// Schedule each cycle one period after the previous cycle started,
    /// or immediately if that moment has passed. Cycle starts are never
    /// closer together than one period.
    #[default]
    Delay,
    /// Keep the absolute schedule `start + n * period`. Cycles that fall
    /// behind run back to back until the schedule is caught up.
    Burst,
}

// ── RealtimeConfig ─────────────────────────────────────────────────

/// Configuration for [`RealtimeEngine`](crate::RealtimeEngine).
#[derive(Clone, Debug, PartialEq)]
pub struct RealtimeConfig {
    /// Target interval between cycle starts. Must be non-zero.
    pub period: Duration,
    /// Name of the background cycle thread. Default: [`DEFAULT_THREAD_NAME`].
    pub thread_name: String,
    /// Late-cycle policy. Default: [`MissedCycles::Delay`].
    pub missed_cycles: MissedCycles,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl RealtimeConfig {
    /// Configuration with the given period and default settings otherwise.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            missed_cycles: MissedCycles::default(),
        }
    }

    /// Build from a period in seconds.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPeriod`] if `secs` is NaN, infinite, zero,
    /// negative, or too large to represent.
    pub fn from_secs_f64(secs: f64) -> Result<Self, ConfigError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::InvalidPeriod { secs });
        }
        let period =
            Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidPeriod { secs })?;
        let config = Self::new(period);
        config.validate()?;
        Ok(config)
    }

    /// Override the worker thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Override the late-cycle policy.
    pub fn with_missed_cycles(mut self, policy: MissedCycles) -> Self {
        self.missed_cycles = policy;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period.is_zero() {
            return Err(ConfigError::InvalidPeriod {
                secs: self.period.as_secs_f64(),
            });
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::InvalidThreadName {
                name: self.thread_name.clone(),
            });
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`RealtimeConfig::validate()`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The period is NaN, infinite, zero, or negative.
    #[error("period must be a finite, positive number of seconds, got {secs}")]
    InvalidPeriod {
        /// The rejected value, in seconds.
        secs: f64,
    },
    /// The thread name contains a NUL byte.
    #[error("thread name {name:?} contains a NUL byte")]
    InvalidThreadName {
        /// The rejected name.
        name: String,
    },
}
