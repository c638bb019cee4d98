//! Position feedback: unwrapping the device's 32-bit counters.
//!
//! The device reports free-running `i32` DDS counters that wrap around.
//! Between two reports a counter moves far less than half its range, so the
//! wrapped difference is always the true motion and can be summed into a
//! 64-bit accumulator.

use steplink_common::consts::STEP_MASK;

use crate::error::FeedbackError;

/// 64-bit position accumulator for one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionAccumulator {
    axis: usize,
    accumulator: i64,
    last_count: i32,
}

impl PositionAccumulator {
    /// Accumulator at zero.
    pub const fn new(axis: usize) -> Self {
        Self {
            axis,
            accumulator: 0,
            last_count: 0,
        }
    }

    /// Fold in a new raw counter value and return the wrapped difference.
    ///
    /// # Errors
    /// `FeedbackError::AccumulatorOverflow` if the sum leaves the `i64`
    /// range; the accumulator is left unchanged.
    pub fn update(&mut self, count: i32) -> Result<i32, FeedbackError> {
        let diff = count.wrapping_sub(self.last_count);
        let next = self
            .accumulator
            .checked_add(i64::from(diff))
            .ok_or(FeedbackError::AccumulatorOverflow { axis: self.axis })?;
        self.accumulator = next;
        self.last_count = count;
        Ok(diff)
    }

    /// Accumulated counter units.
    #[inline]
    pub fn counts(&self) -> i64 {
        self.accumulator
    }

    /// Accumulated position in steps.
    #[inline]
    pub fn steps(&self) -> f64 {
        self.accumulator as f64 * (1.0 / f64::from(STEP_MASK))
    }

    /// Position in user units given `scale_inv = (1 / STEP_MASK) / scale`.
    #[inline]
    pub fn position(&self, scale_inv: f64) -> f64 {
        self.accumulator as f64 * scale_inv
    }

    /// Zero the accumulator and counter history.
    pub fn reset(&mut self) {
        self.accumulator = 0;
        self.last_count = 0;
    }

    #[cfg(test)]
    fn with_counts(axis: usize, accumulator: i64, last_count: i32) -> Self {
        Self {
            axis,
            accumulator,
            last_count,
        }
    }
}
