//! Link supervision across host and device.

use steplink_common::consts::NUM_AXES;
use steplink_common::protocol::OutputBits;

use super::{cycle, rig};

#[test]
fn long_dropout_resets_device_and_latches_fault() {
    let (mut d, mut pins) = rig(&[]);
    pins.motor_enable = true;
    for _ in 0..5 {
        cycle(&mut d, &mut pins);
    }
    assert!(pins.ready);
    assert_eq!(d.transport().device().board().outputs(), OutputBits::MOTOR_ENABLE);

    d.transport_mut().set_connected(false);
    for _ in 0..5 {
        cycle(&mut d, &mut pins);
    }
    assert!(!pins.ready);
    assert!(pins.spi_fault);

    let device = d.transport().device();
    assert_eq!(device.recoveries(), 1);
    assert_eq!(device.board().outputs(), OutputBits::empty());
    assert_eq!(device.board().pwm_duty(), 0);
    assert_eq!(device.stepgen().velocities(), [0; NUM_AXES]);

    d.transport_mut().set_connected(true);
    cycle(&mut d, &mut pins);
    cycle(&mut d, &mut pins);
    assert!(pins.ready);
    assert!(pins.spi_fault, "fault stays latched until acknowledged");
    assert_eq!(d.transport().device().board().outputs(), OutputBits::MOTOR_ENABLE);

    pins.spi_fault = false;
    cycle(&mut d, &mut pins);
    assert!(!pins.spi_fault);
    assert_eq!(d.transport().device().recoveries(), 1);
}

#[test]
fn short_dropout_does_not_reset_device() {
    let (mut d, mut pins) = rig(&[]);
    pins.coolant_enable = true;
    for _ in 0..3 {
        cycle(&mut d, &mut pins);
    }
    d.transport_mut().set_connected(false);
    cycle(&mut d, &mut pins);
    d.transport_mut().set_connected(true);
    cycle(&mut d, &mut pins);

    assert_eq!(d.transport().device().recoveries(), 0);
    assert_eq!(d.transport().device().board().outputs(), OutputBits::COOLANT_ENABLE);
    assert!(pins.spi_fault);
}

#[test]
fn startup_grace_covers_only_the_first_reply() {
    let (mut d, mut pins) = rig(&[]);
    cycle(&mut d, &mut pins);
    assert!(!pins.ready);
    assert!(!pins.spi_fault);
    assert_eq!(d.supervisor().mismatches(), 1);

    for _ in 0..50 {
        cycle(&mut d, &mut pins);
        assert!(pins.ready);
    }
    assert_eq!(d.supervisor().mismatches(), 1);
    assert!(!pins.spi_fault);
}
