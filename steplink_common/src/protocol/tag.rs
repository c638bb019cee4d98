//! Command tags.
//!
//! A tag is four ASCII characters (`">CM1"`) packed little-endian into one
//! 32-bit word, so it reads naturally in a byte dump of the link.

/// Command tag carried in word 0 of every host frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandTag {
    /// Step width and PWM period; resets the board.
    Config = u32::from_le_bytes(*b">CFG"),
    /// Per-axis velocity commands; arms the deferred position report.
    Velocity = u32::from_le_bytes(*b">CM1"),
    /// Output enables and PWM duty; stages inputs for the next reply.
    Io = u32::from_le_bytes(*b">CM2"),
    /// Full board reset.
    Reset = u32::from_le_bytes(*b">RST"),
    /// Echo test: the device answers with every word complemented.
    Test = u32::from_le_bytes(*b">TST"),
}

impl CommandTag {
    /// All tags, in wire-value independent order.
    pub const ALL: [CommandTag; 5] = [
        CommandTag::Config,
        CommandTag::Velocity,
        CommandTag::Io,
        CommandTag::Reset,
        CommandTag::Test,
    ];

    /// Wire representation.
    #[inline]
    pub const fn word(self) -> u32 {
        self as u32
    }

    /// Canary the device reports one exchange after receiving this tag.
    #[inline]
    pub const fn ack_word(self) -> u32 {
        !(self as u32)
    }

    /// Convert from a raw word. Returns `None` for unrecognized values.
    #[inline]
    pub const fn from_word(word: u32) -> Option<Self> {
        const CFG: u32 = CommandTag::Config as u32;
        const CM1: u32 = CommandTag::Velocity as u32;
        const CM2: u32 = CommandTag::Io as u32;
        const RST: u32 = CommandTag::Reset as u32;
        const TST: u32 = CommandTag::Test as u32;
        match word {
            CFG => Some(Self::Config),
            CM1 => Some(Self::Velocity),
            CM2 => Some(Self::Io),
            RST => Some(Self::Reset),
            TST => Some(Self::Test),
            _ => None,
        }
    }

    /// Three-letter mnemonic used in logs.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Config => "CFG",
            Self::Velocity => "CM1",
            Self::Io => "CM2",
            Self::Reset => "RST",
            Self::Test => "TST",
        }
    }
}

impl std::fmt::Display for CommandTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
