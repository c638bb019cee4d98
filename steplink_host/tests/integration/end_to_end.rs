//! Host and device together: motion, feedback and the deferred report.

use steplink_common::consts::{NUM_AXES, UPDATE_CYCLE};
use steplink_common::protocol::{InputBits, OutputBits};
use steplink_host::config::AxisConfig;

use super::{cycle, rig};

fn axis(scale: f64, max_accel: f64) -> AxisConfig {
    AxisConfig { scale, max_accel }
}

#[test]
fn step_command_settles_on_target() {
    let (mut d, mut pins) = rig(&[axis(100.0, 20.0)]);
    pins.position_cmd[0] = 10.0;
    for _ in 0..3000 {
        cycle(&mut d, &mut pins);
    }

    assert!(pins.ready);
    assert!(!pins.spi_fault);
    assert!((pins.position_fb[0] - 10.0).abs() < 1e-3, "fb {}", pins.position_fb[0]);
    assert_eq!(d.axes().state(0).velocity(), 0.0);
    assert_eq!(d.staged().axis_words(), [0; NUM_AXES]);

    let steps = d.transport().device().board().steps();
    assert!((steps[0] - 1000).abs() <= 1, "steps {steps:?}");
    assert_eq!(&steps[1..], &[0, 0, 0]);
}

#[test]
fn ramp_is_tracked_and_settles() {
    let (mut d, mut pins) = rig(&[axis(100.0, 500.0), axis(-100.0, 500.0)]);
    let mut worst = 0.0f64;
    for k in 0..2000u32 {
        let target = f64::from(k.min(1000)) * 0.01;
        pins.position_cmd[0] = target;
        pins.position_cmd[1] = -target;
        cycle(&mut d, &mut pins);
        if (50..1000).contains(&k) {
            worst = worst.max((pins.position_fb[0] - target).abs());
        }
    }
    assert!(worst < 0.05, "tracking error {worst}");
    assert!((pins.position_fb[0] - 10.0).abs() < 1e-3);
    assert!((pins.position_fb[1] + 10.0).abs() < 1e-3);

    // Negative scale: a negative command runs the motor forward.
    let steps = d.transport().device().board().steps();
    assert!((steps[0] - 1000).abs() <= 1);
    assert!((steps[1] - 1000).abs() <= 1);
}

#[test]
fn position_report_is_deferred_and_cycles_reported() {
    let (mut d, mut pins) = rig(&[]);
    for _ in 0..5 {
        cycle(&mut d, &mut pins);
    }
    let timing = d.transport().timing();
    let expected = timing.passes_per_cycle - 2 * timing.passes_per_exchange;
    assert!(pins.report_cycles > UPDATE_CYCLE);
    assert_eq!(pins.report_cycles, expected);
}

#[test]
fn inputs_and_outputs_cross_the_link() {
    let (mut d, mut pins) = rig(&[]);
    d.transport_mut()
        .device_mut()
        .board_mut()
        .set_inputs(InputBits::LIMIT_X | InputBits::ABORT);
    pins.spindle_enable = true;
    pins.pwm_duty = 100.0;
    for _ in 0..6 {
        cycle(&mut d, &mut pins);
    }
    assert!(pins.limit_x && pins.abort);
    assert!(!pins.limit_y && !pins.hold);

    let board = d.transport().device().board();
    assert_eq!(board.outputs(), OutputBits::SPINDLE_ENABLE);
    assert_eq!(board.pwm_duty(), board.pwm_period() + 1);
}

#[test]
fn zero_command_never_steps() {
    let (mut d, mut pins) = rig(&[axis(250.0, 0.0); NUM_AXES]);
    for _ in 0..500 {
        cycle(&mut d, &mut pins);
    }
    assert_eq!(d.transport().device().board().steps(), [0; NUM_AXES]);
    assert_eq!(pins.position_fb, [0.0; NUM_AXES]);
}
