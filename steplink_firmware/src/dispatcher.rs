//! Command dispatch and the deferred position report.
//!
//! A velocity command (`CM1`) restarts a pass counter. Exactly
//! [`UPDATE_CYCLE`] main-loop passes later the position counters are copied
//! into the transmit buffer, so the reply to the following `CM2` carries
//! positions sampled a fixed, known time after the velocities changed.
//!
//! When the next `CM1` arrives the counter value is latched as the elapsed
//! cycles report; `CM2` stages it together with the raw inputs for the reply
//! to the `CM1` after it.

use tracing::{debug, trace};

use steplink_common::consts::UPDATE_CYCLE;
use steplink_common::hal::BoardHal;
use steplink_common::protocol::{Command, CommandTag, Frame, OutputBits, idx};

use crate::stepgen::StepgenShared;

/// Stop the step generator, drop all outputs and zero the PWM duty.
pub fn reset_board<B: BoardHal + ?Sized>(stepgen: &StepgenShared, board: &mut B) {
    stepgen.request_reset();
    board.write_outputs(OutputBits::empty());
    board.set_pwm_duty(0);
}

/// Per-pass command state of the main loop.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    last_command: u32,
    cycles: u32,
    report_cycles: u32,
}

impl Dispatcher {
    /// Fresh dispatcher: no previous command, counters zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw tag word of the last dispatched frame.
    pub fn last_command(&self) -> u32 {
        self.last_command
    }

    /// Passes counted since the last `CM1`.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Latched elapsed-cycles value staged by `CM2`.
    pub fn report_cycles(&self) -> u32 {
        self.report_cycles
    }

    /// Start-of-pass bookkeeping: count passes after `CM1` and capture the
    /// position snapshot on the threshold pass.
    pub fn begin_pass(&mut self, stepgen: &StepgenShared, tx: &mut Frame) {
        if self.last_command != CommandTag::Velocity.word() {
            return;
        }
        if self.cycles == UPDATE_CYCLE {
            tx.set_axis_words(&stepgen.positions());
            trace!(cycles = self.cycles, "position snapshot staged");
        }
        self.cycles = self.cycles.wrapping_add(1);
    }

    /// Act on one received frame.
    ///
    /// Unknown tags leave every piece of state alone except the recorded
    /// last command. Returns the decoded tag, if any.
    pub fn dispatch<B: BoardHal + ?Sized>(
        &mut self,
        rx: &Frame,
        tx: &mut Frame,
        stepgen: &StepgenShared,
        board: &mut B,
    ) -> Option<CommandTag> {
        let tag = match Command::decode(rx) {
            Ok(Command::Reset) => {
                reset_board(stepgen, board);
                Some(CommandTag::Reset)
            }
            Ok(Command::Velocity(velocities)) => {
                stepgen.update_velocities(&velocities);
                self.report_cycles = self.cycles;
                self.cycles = 0;
                Some(CommandTag::Velocity)
            }
            Ok(Command::Io { outputs, pwm_duty }) => {
                board.write_outputs(outputs);
                board.set_pwm_duty(pwm_duty);
                tx.set_word(idx::INPUTS, board.read_inputs().bits());
                tx.set_word(idx::REPORT_CYCLES, self.report_cycles);
                Some(CommandTag::Io)
            }
            Ok(Command::Config {
                step_width,
                pwm_period,
            }) => {
                debug!(step_width, pwm_period, "link configuration received");
                stepgen.set_step_width(step_width);
                board.set_pwm_period(pwm_period);
                reset_board(stepgen, board);
                Some(CommandTag::Config)
            }
            Ok(Command::Test(_)) => {
                *tx = rx.complemented();
                Some(CommandTag::Test)
            }
            Err(e) => {
                debug!(error = %e, "frame dropped");
                None
            }
        };
        self.last_command = rx.tag_word();
        tag
    }
}
