//! Host error types.

use steplink_common::config::ConfigError;
use steplink_common::hal::HalError;
use thiserror::Error;

/// Position feedback errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeedbackError {
    /// The 64-bit accumulator would leave its range.
    #[error("position accumulator overflow on axis {axis}")]
    AccumulatorOverflow {
        /// Axis index.
        axis: usize,
    },
}

/// Errors surfaced by the host driver.
#[derive(Debug, Error)]
pub enum HostError {
    /// Transport failure.
    #[error(transparent)]
    Hal(#[from] HalError),

    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
