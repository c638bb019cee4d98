//! Host boundary values exchanged with the automation framework each cycle.

use steplink_common::consts::NUM_AXES;
use steplink_common::protocol::{InputBits, OutputBits};

use crate::config::HostConfig;

/// Inputs and outputs of one board.
///
/// `scale` and `max_accel` are read-write: the driver corrects them in
/// place (zero scale becomes 1, excess acceleration is clamped).
#[derive(Debug, Clone, PartialEq)]
pub struct HostPins {
    // ─── Inputs ─────────────────────────────────────────────────────
    /// Commanded position per axis [user units].
    pub position_cmd: [f64; NUM_AXES],
    /// Steps per user unit.
    pub scale: [f64; NUM_AXES],
    /// Acceleration limit [user units/s²], 0 for none.
    pub max_accel: [f64; NUM_AXES],
    pub motor_enable: bool,
    pub spindle_enable: bool,
    pub coolant_enable: bool,
    /// Spindle duty in percent of `pwm_scale`.
    pub pwm_duty: f64,
    pub pwm_scale: f64,

    // ─── Outputs ────────────────────────────────────────────────────
    /// Feedback position per axis [user units].
    pub position_fb: [f64; NUM_AXES],
    pub limit_x: bool,
    pub limit_y: bool,
    pub limit_z: bool,
    pub abort: bool,
    pub hold: bool,
    pub resume: bool,
    /// Last reply passed the canary check.
    pub ready: bool,
    /// Sticky link fault. The framework may clear it.
    pub spi_fault: bool,
    /// Device passes between the last two velocity commands.
    pub report_cycles: u32,
}

impl Default for HostPins {
    fn default() -> Self {
        Self {
            position_cmd: [0.0; NUM_AXES],
            scale: [1.0; NUM_AXES],
            max_accel: [1.0; NUM_AXES],
            motor_enable: false,
            spindle_enable: false,
            coolant_enable: false,
            pwm_duty: 0.0,
            pwm_scale: 1.0,
            position_fb: [0.0; NUM_AXES],
            limit_x: false,
            limit_y: false,
            limit_z: false,
            abort: false,
            hold: false,
            resume: false,
            ready: false,
            spi_fault: false,
            report_cycles: 0,
        }
    }
}

impl HostPins {
    /// Pins with the per-axis tuning from `config`.
    pub fn from_config(config: &HostConfig) -> Self {
        let axes = config.axes();
        Self {
            scale: axes.map(|a| a.scale),
            max_accel: axes.map(|a| a.max_accel),
            ..Self::default()
        }
    }

    /// Enable outputs as wire bits.
    pub fn output_bits(&self) -> OutputBits {
        OutputBits::from_enables(self.motor_enable, self.spindle_enable, self.coolant_enable)
    }

    /// Publish debounced input bits.
    pub fn apply_inputs(&mut self, inputs: InputBits) {
        self.abort = inputs.contains(InputBits::ABORT);
        self.hold = inputs.contains(InputBits::HOLD);
        self.resume = inputs.contains(InputBits::RESUME);
        self.limit_x = inputs.contains(InputBits::LIMIT_X);
        self.limit_y = inputs.contains(InputBits::LIMIT_Y);
        self.limit_z = inputs.contains(InputBits::LIMIT_Z);
    }

    /// PWM duty register value for a carrier period.
    pub fn duty_word(&self, pwm_period: u32) -> u32 {
        let fraction = (self.pwm_duty * self.pwm_scale * 0.01).clamp(0.0, 1.0);
        (fraction * (f64::from(pwm_period) + 1.0)) as u32
    }
}
