//! Step-function time series indexed by cycle.
//!
//! # Semantics
//!
//! A [`TimeSeries`] is a non-empty list of `(cycle, value)` points with
//! strictly increasing cycles. [`get(c)`](TimeSeries::get) returns the
//! value of the right-most point at or before `c`:
//!
//! - between points the previous value holds,
//! - after the last point the last value holds,
//! - before the first point the first value is returned.
//!
//! ```
//! use plexus_controllers::TimeSeries;
//! use plexus_core::{CycleId, Value};
//!
//! let ts = TimeSeries::new([(0, 5), (1, 4), (3, 2)]).unwrap();
//! assert_eq!(ts.get(CycleId(2)), &Value::Int(4));
//! assert_eq!(ts.get(CycleId(9)), &Value::Int(2));
//! ```

use plexus_core::{CycleId, Value};

/// Errors raised when building a [`TimeSeries`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    /// No points were given.
    #[error("time series needs at least one point")]
    Empty,
    /// Cycle and value lists differ in length.
    #[error("{cycles} cycles but {values} values")]
    LengthMismatch {
        /// Number of cycles given.
        cycles: usize,
        /// Number of values given.
        values: usize,
    },
    /// A point's cycle is not strictly greater than its predecessor's.
    #[error("point {index} at cycle {cycle} does not follow cycle {previous}")]
    Unordered {
        /// Position of the offending point.
        index: usize,
        /// Cycle of the preceding point.
        previous: u64,
        /// Cycle of the offending point.
        cycle: u64,
    },
}

/// A non-empty, cycle-ordered step function.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    cycles: Vec<u64>,
    values: Vec<Value>,
}

impl TimeSeries {
    /// Build from `(cycle, value)` points.
    pub fn new<V: Into<Value>>(
        points: impl IntoIterator<Item = (u64, V)>,
    ) -> Result<Self, SeriesError> {
        let (cycles, values): (Vec<u64>, Vec<Value>) =
            points.into_iter().map(|(c, v)| (c, v.into())).unzip();
        Self::from_parts(cycles, values)
    }

    /// Build from parallel cycle and value lists.
    pub fn from_parts(cycles: Vec<u64>, values: Vec<Value>) -> Result<Self, SeriesError> {
        if cycles.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                cycles: cycles.len(),
                values: values.len(),
            });
        }
        if cycles.is_empty() {
            return Err(SeriesError::Empty);
        }
        if let Some(index) = cycles.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SeriesError::Unordered {
                index: index + 1,
                previous: cycles[index],
                cycle: cycles[index + 1],
            });
        }
        Ok(Self { cycles, values })
    }

    /// A series holding `value` forever.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self {
            cycles: vec![0],
            values: vec![value.into()],
        }
    }

    /// The value in effect at `cycle`.
    pub fn get(&self, cycle: CycleId) -> &Value {
        let after = self.cycles.partition_point(|&c| c <= cycle.0);
        &self.values[after.saturating_sub(1)]
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    /// Always `false`: a series has at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate points in cycle order.
    pub fn points(&self) -> impl Iterator<Item = (u64, &Value)> {
        self.cycles.iter().copied().zip(self.values.iter())
    }
}
