//! System-wide constants for the steplink workspace.
//!
//! Single source of truth for every numeric contract shared by the host and
//! the device. Both sides are built from the same values; none of them can be
//! changed at runtime.

/// Number of stepper axes driven by one board.
pub const NUM_AXES: usize = 4;

/// 32-bit words per frame, identical in both directions.
pub const FRAME_WORDS: usize = 5;

/// Bytes per frame on the wire.
pub const FRAME_BYTES: usize = FRAME_WORDS * 4;

/// Step interrupt frequency [Hz].
pub const BASE_FREQ: u32 = 80_000;

/// Accumulator bit whose toggle corresponds to one step.
pub const STEP_BIT: u32 = 22;

/// Counter units per step.
pub const STEP_MASK: i32 = 1 << STEP_BIT;

/// Converts steps/s into counter units added per interrupt tick.
pub const VEL_SCALE: f64 = STEP_MASK as f64 / BASE_FREQ as f64;

/// Device peripheral clock [Hz], the PWM period base.
pub const SYS_FREQ: u32 = 40_000_000;

/// Main-loop passes after a velocity command before the position snapshot
/// is captured for the next report.
pub const UPDATE_CYCLE: u32 = 300;

/// Main-loop passes without bus activity before the device recovers the link.
pub const LINK_TIMEOUT: u32 = 1000;

/// Default host cycle time in microseconds (1 kHz).
pub const DEFAULT_CYCLE_TIME_US: u32 = 1000;

/// Default step pulse width in units of `1 / BASE_FREQ`.
pub const DEFAULT_STEP_WIDTH: u32 = 1;

/// Default PWM carrier frequency [Hz].
pub const DEFAULT_PWM_FREQ_HZ: u32 = 1000;

/// Scales closer to zero than this are replaced by `1.0`.
pub const SCALE_EPSILON: f64 = 1e-20;

/// Velocity limit in steps/s for a given step pulse width.
///
/// A step needs `step_width` ticks high and the same low, and the generator
/// keeps a further factor of two of headroom.
#[inline]
pub fn max_velocity(step_width: u32) -> f64 {
    BASE_FREQ as f64 / (4.0 * step_width.max(1) as f64)
}

/// PWM period register value for a carrier frequency.
#[inline]
pub fn pwm_period(pwm_freq_hz: u32) -> u32 {
    (SYS_FREQ / pwm_freq_hz.max(1)).saturating_sub(1)
}
