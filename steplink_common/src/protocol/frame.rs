//! Fixed-size frame.

use static_assertions::const_assert_eq;

use super::ProtocolError;
use super::tag::CommandTag;
use crate::consts::{FRAME_BYTES, FRAME_WORDS, NUM_AXES};

/// Word indexes within a frame.
pub mod idx {
    /// Command tag (host) or canary (device).
    pub const TAG: usize = 0;
    /// First payload word.
    pub const PAYLOAD: usize = 1;

    /// `CFG`: step width.
    pub const STEP_WIDTH: usize = 1;
    /// `CFG`: PWM period.
    pub const PWM_PERIOD: usize = 2;
    /// `CM1` and position reports: first axis word.
    pub const AXIS_0: usize = 1;
    /// `CM2`: output enable bits.
    pub const OUTPUTS: usize = 1;
    /// `CM2`: PWM duty.
    pub const PWM_DUTY: usize = 2;
    /// Reply to `CM1`: raw input bits.
    pub const INPUTS: usize = 1;
    /// Reply to `CM1`: main-loop passes between the last two `CM1`.
    pub const REPORT_CYCLES: usize = 2;
}

/// One protocol exchange unit: `FRAME_WORDS` 32-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct Frame([u32; FRAME_WORDS]);

const_assert_eq!(core::mem::size_of::<Frame>(), FRAME_BYTES);

impl Frame {
    /// Frame with the given tag and an all-zero payload.
    #[inline]
    pub const fn new(tag: CommandTag) -> Self {
        let mut words = [0u32; FRAME_WORDS];
        words[idx::TAG] = tag.word();
        Self(words)
    }

    /// Wrap raw words.
    #[inline]
    pub const fn from_words(words: [u32; FRAME_WORDS]) -> Self {
        Self(words)
    }

    /// Raw words.
    #[inline]
    pub const fn words(&self) -> &[u32; FRAME_WORDS] {
        &self.0
    }

    /// Mutable raw words.
    #[inline]
    pub fn words_mut(&mut self) -> &mut [u32; FRAME_WORDS] {
        &mut self.0
    }

    /// Word at `index`.
    #[inline]
    pub const fn word(&self, index: usize) -> u32 {
        self.0[index]
    }

    /// Overwrite the word at `index`.
    #[inline]
    pub fn set_word(&mut self, index: usize, value: u32) {
        self.0[index] = value;
    }

    /// Raw word 0.
    #[inline]
    pub const fn tag_word(&self) -> u32 {
        self.0[idx::TAG]
    }

    /// Decoded tag, `None` when word 0 is not a known command.
    #[inline]
    pub const fn tag(&self) -> Option<CommandTag> {
        CommandTag::from_word(self.0[idx::TAG])
    }

    /// Every word complemented (the `TST` echo).
    #[inline]
    pub fn complemented(&self) -> Self {
        Self(self.0.map(|w| !w))
    }

    /// Per-axis words as signed counters.
    pub fn axis_words(&self) -> [i32; NUM_AXES] {
        core::array::from_fn(|i| self.0[idx::AXIS_0 + i] as i32)
    }

    /// Store per-axis signed values.
    pub fn set_axis_words(&mut self, values: &[i32; NUM_AXES]) {
        for (i, v) in values.iter().enumerate() {
            self.0[idx::AXIS_0 + i] = *v as u32;
        }
    }

    /// Little-endian byte image, word 0 first.
    pub fn to_bytes(&self) -> [u8; FRAME_BYTES] {
        let mut out = [0u8; FRAME_BYTES];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Parse a little-endian byte image.
    pub fn from_bytes(bytes: &[u8; FRAME_BYTES]) -> Self {
        let mut words = [0u32; FRAME_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(words)
    }

    /// Parse a byte slice that must hold exactly one frame.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let image: &[u8; FRAME_BYTES] =
            bytes.try_into().map_err(|_| ProtocolError::Length {
                expected: FRAME_BYTES,
                actual: bytes.len(),
            })?;
        Ok(Self::from_bytes(image))
    }
}
