//! Device side of the serial link.
//!
//! Models the receive/transmit buffer pair that the DMA engine moves through
//! the serial peripheral. An exchange copies the incoming frame into the
//! receive buffer while the transmit buffer, as it stood when the exchange
//! began, goes out. Completion is signalled through two latched events that
//! the main loop polls:
//!
//! - half-buffer: time to write the integrity canary for the *next* reply;
//! - full-buffer: the received frame is complete and may be dispatched.
//!
//! The link also watches for silence. Bus activity reloads a countdown of
//! [`LINK_TIMEOUT`] main-loop passes; when the countdown runs out the caller
//! is told to recover the peripheral.

use steplink_common::consts::LINK_TIMEOUT;
use steplink_common::protocol::{Frame, idx};

/// Events latched by completed exchanges since the last poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkEvents {
    /// Receive buffer at least half full.
    pub half: bool,
    /// Receive buffer complete.
    pub full: bool,
}

/// Outcome of one silence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    /// Countdown running or idle.
    Ok,
    /// The link has been silent for the full timeout; recover it now.
    Recovery,
}

/// Receive/transmit buffers plus latched events and the silence countdown.
#[derive(Debug, Clone)]
pub struct DmaLink {
    rx: Frame,
    tx: Frame,
    events: LinkEvents,
    busy: bool,
    timeout: u32,
    exchanges: u64,
}

impl Default for DmaLink {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaLink {
    /// Empty buffers, countdown idle.
    pub fn new() -> Self {
        Self {
            rx: Frame::default(),
            tx: Frame::default(),
            events: LinkEvents::default(),
            busy: false,
            timeout: 0,
            exchanges: 0,
        }
    }

    /// Clock one frame in and the current transmit buffer out.
    pub fn exchange(&mut self, incoming: &Frame) -> Frame {
        let outgoing = self.tx;
        self.rx = *incoming;
        self.events = LinkEvents {
            half: true,
            full: true,
        };
        self.busy = true;
        self.exchanges += 1;
        outgoing
    }

    /// Take and clear the latched events.
    pub fn take_events(&mut self) -> LinkEvents {
        std::mem::take(&mut self.events)
    }

    /// Write the canary: the complement of the tag just received.
    pub fn write_canary(&mut self) {
        self.tx.set_word(idx::TAG, !self.rx.tag_word());
    }

    /// Advance the silence countdown by one main-loop pass.
    ///
    /// Recovery is reported exactly once per silent period: on the pass
    /// where the countdown reaches 1.
    pub fn supervise(&mut self) -> LinkHealth {
        if std::mem::take(&mut self.busy) {
            self.timeout = LINK_TIMEOUT;
            return LinkHealth::Ok;
        }
        if self.timeout > 0 {
            self.timeout -= 1;
        }
        if self.timeout == 1 {
            LinkHealth::Recovery
        } else {
            LinkHealth::Ok
        }
    }

    /// Whether the countdown is running (the link counts as active).
    pub fn is_active(&self) -> bool {
        self.timeout > 0
    }

    /// Drop any latched events after the peripheral was reinitialized.
    pub fn restart(&mut self) {
        self.events = LinkEvents::default();
        self.busy = false;
    }

    /// Last received frame.
    pub fn rx(&self) -> &Frame {
        &self.rx
    }

    /// Frame that will go out with the next exchange.
    pub fn tx(&self) -> &Frame {
        &self.tx
    }

    /// Mutable transmit buffer.
    pub fn tx_mut(&mut self) -> &mut Frame {
        &mut self.tx
    }

    /// Exchanges completed since construction.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }
}
