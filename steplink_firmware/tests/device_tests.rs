//! Device core driven through its public API, the way a bus master and the
//! step timer would drive it.

use proptest::prelude::*;
use steplink_common::consts::{NUM_AXES, STEP_MASK, UPDATE_CYCLE};
use steplink_common::protocol::{Command, CommandTag, Frame, InputBits, OutputBits, idx};
use steplink_firmware::{Device, SimBoard};

/// Main-loop passes between two interrupt ticks.
const PASSES_PER_TICK: u32 = 5;

fn run(dev: &mut Device<SimBoard>, passes: u32) {
    for pass in 0..passes {
        if pass % PASSES_PER_TICK == 0 {
            dev.isr_tick();
        }
        dev.service();
    }
}

fn io(outputs: OutputBits, pwm_duty: u32) -> Command {
    Command::Io { outputs, pwm_duty }
}

#[test]
fn host_cycle_sequence_reports_positions_and_inputs() {
    let mut dev = Device::new(SimBoard::new());
    dev.board_mut().set_inputs(InputBits::ABORT | InputBits::LIMIT_Z);

    dev.exchange(&Command::Config { step_width: 1, pwm_period: 39_999 }.encode());
    run(&mut dev, 10);

    let velocity = STEP_MASK / 8;
    dev.exchange(&Command::Velocity([velocity, -velocity, 0, 0]).encode());
    run(&mut dev, 400);

    // CM2 exchange: positions snapshotted UPDATE_CYCLE passes after CM1.
    let reply = dev.exchange(&io(OutputBits::MOTOR_ENABLE, 100).encode());
    assert_eq!(reply.tag_word(), CommandTag::Velocity.ack_word());
    let positions = reply.axis_words();
    let ticks_at_snapshot = (UPDATE_CYCLE + 2).div_ceil(PASSES_PER_TICK) as i32;
    assert!((positions[0] / velocity - ticks_at_snapshot).abs() <= 1);
    assert_eq!(positions[1], -positions[0]);
    run(&mut dev, 4);
    assert_eq!(dev.board().outputs(), OutputBits::MOTOR_ENABLE);
    assert_eq!(dev.board().pwm_duty(), 100);

    // Next CM1 exchange returns inputs and the elapsed-cycles report.
    let reply = dev.exchange(&Command::Velocity([0; NUM_AXES]).encode());
    assert_eq!(reply.tag_word(), CommandTag::Io.ack_word());
    assert_eq!(
        InputBits::from_bits_truncate(reply.word(idx::INPUTS)),
        InputBits::ABORT | InputBits::LIMIT_Z
    );
    run(&mut dev, 4);
    assert!(dev.dispatcher().report_cycles() > UPDATE_CYCLE);
}

#[test]
fn steps_match_counter() {
    let mut dev = Device::new(SimBoard::new());
    dev.exchange(&Command::Velocity([STEP_MASK / 4, 0, -STEP_MASK / 4, 0]).encode());
    run(&mut dev, 2);
    for _ in 0..1000 {
        dev.isr_tick();
    }
    let pos = dev.stepgen().positions();
    let steps = dev.board().steps();
    assert!((steps[0] - i64::from(pos[0] / STEP_MASK)).abs() <= 1);
    assert!((steps[2] - i64::from(pos[2] / STEP_MASK)).abs() <= 1);
    assert!(steps[2] < 0);
    assert_eq!(steps[1], 0);
}

#[test]
fn unknown_frames_only_get_a_canary() {
    let mut dev = Device::new(SimBoard::new());
    dev.exchange(&io(OutputBits::SPINDLE_ENABLE, 5).encode());
    run(&mut dev, 3);
    let junk = Frame::from_words([0xCAFE_F00D, 1, 2, 3, 4]);
    dev.exchange(&junk);
    run(&mut dev, 3);
    let reply = dev.exchange(&Command::Reset.encode());
    assert_eq!(reply.tag_word(), !0xCAFE_F00D);
    assert_eq!(dev.board().outputs(), OutputBits::SPINDLE_ENABLE);
    assert_eq!(dev.dispatcher().last_command(), 0xCAFE_F00D);
}

proptest! {
    #[test]
    fn test_echo_complements_any_payload(payload in any::<[u32; 4]>()) {
        let mut dev = Device::new(SimBoard::new());
        let probe = Command::Test(payload).encode();
        dev.exchange(&probe);
        run(&mut dev, 2);
        let echo = dev.exchange(&Command::Reset.encode());
        prop_assert_eq!(echo, probe.complemented());
    }
}
