//! Loopback transport to an in-process device core.
//!
//! Simulated time is counted in device main-loop passes. Before each exchange
//! the link runs the passes that would elapse on real hardware, firing one
//! step interrupt every [`SimTiming::passes_per_tick`] passes. The host opens
//! every cycle with an `Io` exchange, so that is where the bulk of a cycle's
//! passes are spent.

use steplink_common::consts::BASE_FREQ;
use steplink_common::hal::{HalError, LinkTransport};
use steplink_common::protocol::{CommandTag, Frame};
use steplink_firmware::{Device, SimBoard};
use tracing::{debug, trace};

/// Pass budget of the simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimTiming {
    /// Device passes per host cycle.
    pub passes_per_cycle: u32,
    /// Passes run ahead of each mid-cycle exchange.
    pub passes_per_exchange: u32,
    /// Passes per step interrupt.
    pub passes_per_tick: u32,
}

impl Default for SimTiming {
    fn default() -> Self {
        Self::for_cycle(1000)
    }
}

impl SimTiming {
    /// Budget for a host period of `cycle_time_us`, keeping the step
    /// interrupt at [`BASE_FREQ`].
    pub fn for_cycle(cycle_time_us: u32) -> Self {
        let passes_per_tick = 5;
        let ticks = u64::from(BASE_FREQ) * u64::from(cycle_time_us) / 1_000_000;
        let passes_per_cycle =
            u32::try_from(ticks * u64::from(passes_per_tick)).unwrap_or(u32::MAX);
        Self {
            passes_per_cycle,
            passes_per_exchange: 8,
            passes_per_tick,
        }
    }

    fn passes_before(&self, frame: &Frame) -> u32 {
        if frame.tag() == Some(CommandTag::Io) {
            self.passes_per_cycle.saturating_sub(2 * self.passes_per_exchange)
        } else {
            self.passes_per_exchange
        }
    }
}

/// [`LinkTransport`] wired straight into a [`Device<SimBoard>`].
pub struct SimulatedLink {
    device: Device<SimBoard>,
    timing: SimTiming,
    pending: Option<Frame>,
    passes: u64,
    connected: bool,
}

impl SimulatedLink {
    /// Link to a freshly reset simulated board.
    pub fn new(timing: SimTiming) -> Self {
        debug!(?timing, "simulated link created");
        Self {
            device: Device::new(SimBoard::new()),
            timing,
            pending: None,
            passes: 0,
            connected: true,
        }
    }

    /// Run `passes` device main-loop passes with interleaved step ticks.
    pub fn advance(&mut self, passes: u32) {
        let per_tick = u64::from(self.timing.passes_per_tick.max(1));
        for _ in 0..passes {
            self.device.service();
            self.passes += 1;
            if self.passes % per_tick == 0 {
                self.device.isr_tick();
            }
        }
    }

    /// Connect or cut the wire. A cut wire reads as all zeros and the
    /// device sees no bus activity.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Wire state.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Device core.
    pub fn device(&self) -> &Device<SimBoard> {
        &self.device
    }

    /// Mutable device core, e.g. to drive board inputs.
    pub fn device_mut(&mut self) -> &mut Device<SimBoard> {
        &mut self.device
    }

    /// Pass budget.
    pub fn timing(&self) -> SimTiming {
        self.timing
    }

    /// Passes simulated so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

impl LinkTransport for SimulatedLink {
    fn name(&self) -> &'static str {
        "loopback"
    }

    fn start_exchange(&mut self, tx: &Frame) -> Result<(), HalError> {
        if self.pending.is_some() {
            return Err(HalError::CommunicationError(
                "exchange already in progress".into(),
            ));
        }
        self.advance(self.timing.passes_before(tx));

        let rx = if self.connected {
            self.device.exchange(tx)
        } else {
            Frame::default()
        };
        trace!(
            tx = ?tx.tag(),
            rx0 = format_args!("0x{:08X}", rx.tag_word()),
            "exchange"
        );
        self.pending = Some(rx);
        Ok(())
    }

    fn finish_exchange(&mut self) -> Result<Frame, HalError> {
        self.pending.take().ok_or(HalError::NoExchangePending)
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        self.pending = None;
        debug!(passes = self.passes, "simulated link shut down");
        Ok(())
    }
}
