//! Typed command payloads.
//!
//! [`Command`] is the structured view of a host frame. Encoding always
//! produces a full-size frame; unused payload words are zero.

use super::ProtocolError;
use super::bits::OutputBits;
use super::frame::{Frame, idx};
use super::tag::CommandTag;
use crate::consts::{FRAME_WORDS, NUM_AXES};

/// A decoded host → device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `CFG`: link configuration, applied before a full board reset.
    Config {
        /// Step pulse width in interrupt ticks.
        step_width: u32,
        /// PWM period register value.
        pwm_period: u32,
    },
    /// `CM1`: per-axis velocity in counter units per tick.
    Velocity([i32; NUM_AXES]),
    /// `CM2`: output enables and PWM duty register value.
    Io {
        /// Enable bits. Unknown bits are preserved.
        outputs: OutputBits,
        /// PWM duty register value.
        pwm_duty: u32,
    },
    /// `RST`: full board reset.
    Reset,
    /// `TST`: echo test with an arbitrary payload.
    Test([u32; FRAME_WORDS - 1]),
}

impl Command {
    /// Tag of this command.
    pub const fn tag(&self) -> CommandTag {
        match self {
            Self::Config { .. } => CommandTag::Config,
            Self::Velocity(_) => CommandTag::Velocity,
            Self::Io { .. } => CommandTag::Io,
            Self::Reset => CommandTag::Reset,
            Self::Test(_) => CommandTag::Test,
        }
    }

    /// Serialize into a frame.
    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new(self.tag());
        match self {
            Self::Config {
                step_width,
                pwm_period,
            } => {
                frame.set_word(idx::STEP_WIDTH, *step_width);
                frame.set_word(idx::PWM_PERIOD, *pwm_period);
            }
            Self::Velocity(velocities) => frame.set_axis_words(velocities),
            Self::Io { outputs, pwm_duty } => {
                frame.set_word(idx::OUTPUTS, outputs.bits());
                frame.set_word(idx::PWM_DUTY, *pwm_duty);
            }
            Self::Reset => {}
            Self::Test(payload) => {
                frame.words_mut()[idx::PAYLOAD..].copy_from_slice(payload);
            }
        }
        frame
    }

    /// Parse a frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::UnknownTag`] when word 0 is not a command.
    pub fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let tag = frame
            .tag()
            .ok_or(ProtocolError::UnknownTag(frame.tag_word()))?;
        Ok(match tag {
            CommandTag::Config => Self::Config {
                step_width: frame.word(idx::STEP_WIDTH),
                pwm_period: frame.word(idx::PWM_PERIOD),
            },
            CommandTag::Velocity => Self::Velocity(frame.axis_words()),
            CommandTag::Io => Self::Io {
                outputs: OutputBits::from_bits_retain(frame.word(idx::OUTPUTS)),
                pwm_duty: frame.word(idx::PWM_DUTY),
            },
            CommandTag::Reset => Self::Reset,
            CommandTag::Test => {
                let mut payload = [0u32; FRAME_WORDS - 1];
                payload.copy_from_slice(&frame.words()[idx::PAYLOAD..]);
                Self::Test(payload)
            }
        })
    }
}

impl From<Command> for Frame {
    fn from(cmd: Command) -> Self {
        cmd.encode()
    }
}

impl TryFrom<&Frame> for Command {
    type Error = ProtocolError;

    fn try_from(frame: &Frame) -> Result<Self, Self::Error> {
        Command::decode(frame)
    }
}
