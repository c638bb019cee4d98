//! Wire protocol between host and device.
//!
//! Every exchange moves one fixed-size [`Frame`] in each direction at the same
//! time. Word 0 of a host frame is a [`CommandTag`]; the remaining words are
//! the command payload. Word 0 of a device frame is the integrity canary, the
//! complement of the tag received during the previous exchange.
//!
//! # Reply layout
//!
//! The device clocks out whatever its transmit buffer holds when the exchange
//! starts, so a reply always reflects work done before that exchange:
//!
//! | Exchange carrying | Reply word 0 | Reply payload |
//! |-------------------|--------------|---------------|
//! | `CM2` | `!CM1` | position counters, one word per axis |
//! | `CM1` | `!CM2` | raw input bits, elapsed-cycles report |
//!
//! - [`tag`] - Closed set of command tags and their wire words
//! - [`frame`] - Fixed-size frame and byte serialization
//! - [`command`] - Typed command payloads
//! - [`bits`] - Digital I/O bitflags

pub mod bits;
pub mod command;
pub mod frame;
pub mod tag;

pub use bits::{InputBits, OutputBits};
pub use command::Command;
pub use frame::{Frame, idx};
pub use tag::CommandTag;

use thiserror::Error;

/// Errors raised while decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Word 0 is not one of the known command tags.
    #[error("unknown command tag 0x{0:08X}")]
    UnknownTag(u32),

    /// Byte buffer does not hold exactly one frame.
    #[error("frame length mismatch: expected {expected} bytes, got {actual}")]
    Length {
        /// Required byte count.
        expected: usize,
        /// Byte count received.
        actual: usize,
    },
}
