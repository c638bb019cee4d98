//! Prelude module for common re-exports.
//!
//! ```rust
//! use steplink_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{BASE_FREQ, FRAME_WORDS, NUM_AXES, STEP_BIT, STEP_MASK, VEL_SCALE};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::protocol::{Command, CommandTag, Frame, InputBits, OutputBits, ProtocolError};

// ─── HAL ────────────────────────────────────────────────────────────
pub use crate::hal::{BoardHal, HalError, LinkTransport, StepOutputs};
