//! Link integrity supervision.
//!
//! Every reply carries the complement of the previous command's tag in
//! word 0. A matching canary means the device saw our last frame intact.

use steplink_common::protocol::CommandTag;
use tracing::warn;

/// Verdict of one canary check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCheck {
    /// Canary matched.
    Ok,
    /// Mismatch absorbed by the startup grace.
    Grace,
    /// Mismatch that latched the fault.
    Fault,
}

/// Host-side link state.
#[derive(Debug, Clone)]
pub struct LinkSupervisor {
    ready: bool,
    fault: bool,
    startup_grace: bool,
    last_reply: u32,
    mismatches: u64,
}

impl Default for LinkSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkSupervisor {
    /// Not ready, no fault, grace available.
    pub const fn new() -> Self {
        Self {
            ready: false,
            fault: false,
            startup_grace: true,
            last_reply: 0,
            mismatches: 0,
        }
    }

    /// Check the canary word of a reply against the tag it should acknowledge.
    pub fn check(&mut self, reply_word0: u32, expected: CommandTag) -> LinkCheck {
        self.last_reply = reply_word0;
        if reply_word0 == expected.ack_word() {
            self.ready = true;
            return LinkCheck::Ok;
        }

        self.ready = false;
        self.mismatches += 1;
        if std::mem::take(&mut self.startup_grace) {
            return LinkCheck::Grace;
        }
        if !self.fault {
            warn!(
                expected = expected.mnemonic(),
                got = format_args!("0x{reply_word0:08X}"),
                "link canary mismatch, fault latched"
            );
        }
        self.fault = true;
        LinkCheck::Fault
    }

    /// Canary of the last checked reply.
    pub fn last_reply(&self) -> u32 {
        self.last_reply
    }

    /// Last reply was intact.
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Sticky fault flag.
    pub fn fault(&self) -> bool {
        self.fault
    }

    /// Raise the fault flag from outside the canary check.
    pub fn set_fault(&mut self) {
        self.fault = true;
    }

    /// Acknowledge the fault.
    pub fn clear_fault(&mut self) {
        self.fault = false;
    }

    /// Mismatches seen, grace included.
    pub fn mismatches(&self) -> u64 {
        self.mismatches
    }
}
