//! Host configuration file.
//!
//! ```toml
//! [shared]
//! service_name = "steplink"
//! log_level = "info"
//!
//! [link]
//! cycle_time_us = 1000
//! step_width = 1
//! pwm_freq_hz = 1000
//! active_axes = 4
//!
//! [[axis]]
//! scale = 200.0
//! max_accel = 50.0
//! ```
//!
//! Axes not listed keep the defaults (`scale = 1`, `max_accel = 1`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use steplink_common::config::{ConfigError, SharedConfig, Validate, check_range};
use steplink_common::consts::{
    DEFAULT_CYCLE_TIME_US, DEFAULT_PWM_FREQ_HZ, DEFAULT_STEP_WIDTH, NUM_AXES, SYS_FREQ,
    max_velocity, pwm_period,
};

/// Shortest accepted host cycle [µs].
pub const MIN_CYCLE_TIME_US: u32 = 100;
/// Longest accepted host cycle [µs].
pub const MAX_CYCLE_TIME_US: u32 = 100_000;

// ─── Link ───────────────────────────────────────────────────────────

/// Timing and device settings sent with the startup `CFG` frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    /// Host cycle period [µs].
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,
    /// Step pulse width in step-interrupt ticks.
    #[serde(default = "default_step_width")]
    pub step_width: u32,
    /// Spindle PWM carrier [Hz].
    #[serde(default = "default_pwm_freq_hz")]
    pub pwm_freq_hz: u32,
    /// Axes the planner drives, counted from axis 0. The rest are held at
    /// zero velocity.
    #[serde(default = "default_active_axes")]
    pub active_axes: usize,
}

fn default_cycle_time_us() -> u32 {
    DEFAULT_CYCLE_TIME_US
}

fn default_step_width() -> u32 {
    DEFAULT_STEP_WIDTH
}

fn default_pwm_freq_hz() -> u32 {
    DEFAULT_PWM_FREQ_HZ
}

fn default_active_axes() -> usize {
    NUM_AXES
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: DEFAULT_CYCLE_TIME_US,
            step_width: DEFAULT_STEP_WIDTH,
            pwm_freq_hz: DEFAULT_PWM_FREQ_HZ,
            active_axes: NUM_AXES,
        }
    }
}

impl LinkConfig {
    /// Cycle period.
    pub fn cycle_time(&self) -> Duration {
        Duration::from_micros(u64::from(self.cycle_time_us))
    }

    /// Cycle period [ns].
    pub fn cycle_time_ns(&self) -> i64 {
        i64::from(self.cycle_time_us) * 1000
    }

    /// PWM period register value.
    pub fn pwm_period(&self) -> u32 {
        pwm_period(self.pwm_freq_hz)
    }

    /// Velocity limit [steps/s].
    pub fn max_velocity(&self) -> f64 {
        max_velocity(self.step_width)
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Per-axis tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Steps per user unit. Sign selects direction.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Acceleration limit [user units/s²]. Zero or negative: no user limit.
    #[serde(default = "default_max_accel")]
    pub max_accel: f64,
}

fn default_scale() -> f64 {
    1.0
}

fn default_max_accel() -> f64 {
    1.0
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            max_accel: 1.0,
        }
    }
}

// ─── File ───────────────────────────────────────────────────────────

/// Complete host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Common service settings.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Link settings.
    #[serde(default)]
    pub link: LinkConfig,
    /// Axis settings, in axis order.
    #[serde(default)]
    pub axis: heapless::Vec<AxisConfig, NUM_AXES>,
}

impl HostConfig {
    /// Settings for every axis, defaults filling the unlisted ones.
    pub fn axes(&self) -> [AxisConfig; NUM_AXES] {
        std::array::from_fn(|i| self.axis.get(i).copied().unwrap_or_default())
    }
}

impl Validate for HostConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        check_range(
            "link.cycle_time_us",
            self.link.cycle_time_us,
            MIN_CYCLE_TIME_US,
            MAX_CYCLE_TIME_US,
        )?;
        check_range("link.step_width", self.link.step_width, 1, u32::MAX)?;
        check_range("link.pwm_freq_hz", self.link.pwm_freq_hz, 1, SYS_FREQ)?;
        check_range("link.active_axes", self.link.active_axes, 1, NUM_AXES)?;
        for (i, axis) in self.axis.iter().enumerate() {
            if !axis.scale.is_finite() || !axis.max_accel.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "axis {i}: scale and max_accel must be finite"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use steplink_common::config::ConfigLoader;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_gives_defaults() {
        let config = HostConfig::parse("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.link, LinkConfig::default());
        assert_eq!(config.axes(), [AxisConfig::default(); NUM_AXES]);
        assert_eq!(config.link.pwm_period(), 39_999);
        assert_eq!(config.link.max_velocity(), 20_000.0);
        assert_eq!(config.link.cycle_time(), Duration::from_millis(1));
    }

    #[test]
    fn listed_axes_override_defaults() {
        let config = HostConfig::parse(
            r#"
[[axis]]
scale = 200.0
max_accel = 25.0

[[axis]]
scale = -80.0
"#,
        )
        .unwrap();
        let axes = config.axes();
        assert_eq!(axes[0].scale, 200.0);
        assert_eq!(axes[0].max_accel, 25.0);
        assert_eq!(axes[1].scale, -80.0);
        assert_eq!(axes[1].max_accel, 1.0);
        assert_eq!(axes[3], AxisConfig::default());
    }

    #[test]
    fn too_many_axes_rejected() {
        let text = "[[axis]]\n".repeat(NUM_AXES + 1);
        assert!(matches!(
            HostConfig::parse(&text),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(HostConfig::parse("[link]\nbaud = 9600\n").is_err());
    }

    #[test]
    fn range_checks() {
        let mut config = HostConfig::default();
        config.link.cycle_time_us = 50;
        assert!(config.validate().is_err());

        config.link.cycle_time_us = 1000;
        config.link.step_width = 0;
        assert!(config.validate().is_err());

        config.link.step_width = 1;
        config.link.pwm_freq_hz = SYS_FREQ + 1;
        assert!(config.validate().is_err());

        config.link.pwm_freq_hz = 20_000;
        assert!(config.validate().is_ok());

        config.link.active_axes = 0;
        assert!(config.validate().is_err());
        config.link.active_axes = NUM_AXES + 1;
        assert!(config.validate().is_err());
        config.link.active_axes = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[link]\ncycle_time_us = 500\nactive_axes = 3\n\n[[axis]]\nscale = -40.0"
        )
        .unwrap();
        file.flush().unwrap();

        let config = HostConfig::load_validated(file.path()).unwrap();
        assert_eq!(config.link.cycle_time_us, 500);
        assert_eq!(config.link.active_axes, 3);
        assert_eq!(config.axes()[0].scale, -40.0);
    }

    #[test]
    fn invalid_file_rejected_after_parse() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[link]\nactive_axes = 0").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            HostConfig::load_validated(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn non_finite_axis_rejected() {
        let mut config = HostConfig::default();
        config
            .axis
            .push(AxisConfig {
                scale: f64::NAN,
                max_accel: 1.0,
            })
            .unwrap();
        assert!(config.validate().is_err());
    }
}
