//! # steplink host
//!
//! Host side of the steplink split stepper controller. A periodic scheduler
//! calls the driver's `read`, `update` and `write` once per cycle; the
//! driver plans accel-limited velocities, exchanges frames with the device
//! and publishes unwrapped position feedback and debounced inputs.
//!
//! ## Module Structure
//!
//! - [`planner`] - Per-axis velocity matching and trajectory correction
//! - [`feedback`] - 32 → 64-bit position counter unwrapping
//! - [`debounce`] - Three-sample input filter
//! - [`supervisor`] - Link canary check with startup grace
//! - [`driver`] - The read / update / write functions
//! - [`cycle`] - Periodic runner and RT setup
//! - [`transport`] - Link transports, including the simulated loopback
//!
//! ## Cycle
//!
//! ```text
//!  read ──► finish CM1 ─► inputs ─► CM2 exchange ─► canary ─► feedback
//!  update ─► planner ─► stage CM1
//!  write ──► start CM1 (completes in the next read)
//! ```
//!
//! The cycle performs no heap allocation.

pub mod config;
pub mod cycle;
pub mod debounce;
pub mod driver;
pub mod error;
pub mod feedback;
pub mod pins;
pub mod planner;
pub mod supervisor;
pub mod transport;

pub use crate::driver::HostDriver;
pub use crate::error::{FeedbackError, HostError};
pub use crate::pins::HostPins;
