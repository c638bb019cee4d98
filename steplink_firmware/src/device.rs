//! Firmware main loop.
//!
//! [`Device`] ties the board, the step generator mailboxes, the DMA link and
//! the dispatcher together. A hardware port calls [`Device::service`] from
//! its endless main loop, [`Device::isr_tick`] from the step timer
//! interrupt, and lets the DMA engine feed [`Device::exchange`].

use std::sync::Arc;

use steplink_common::consts::NUM_AXES;
use steplink_common::hal::{BoardHal, StepOutputs};
use steplink_common::protocol::{CommandTag, Frame};
use tracing::{debug, info, warn};

use crate::dispatcher::{Dispatcher, reset_board};
use crate::stepgen::{StepGenerator, StepgenShared};
use crate::transport::{DmaLink, LinkHealth};

/// LED toggle period in passes while the link is active.
pub const LED_PERIOD_ACTIVE: u64 = 0x10000;
/// LED toggle period in passes while the link is idle.
pub const LED_PERIOD_IDLE: u64 = 0x40000;

/// Device-side controller core.
pub struct Device<B: BoardHal> {
    board: B,
    stepgen: Arc<StepgenShared>,
    generator: StepGenerator,
    link: DmaLink,
    dispatcher: Dispatcher,
    data_ready: bool,
    passes: u64,
    recoveries: u32,
}

impl<B: BoardHal> Device<B> {
    /// Bring the core up on an initialized board and reset it.
    pub fn new(mut board: B) -> Self {
        let stepgen = Arc::new(StepgenShared::new());
        let generator = StepGenerator::new(Arc::clone(&stepgen));
        reset_board(&stepgen, &mut board);
        info!(axes = NUM_AXES, "device core started");

        Self {
            board,
            stepgen,
            generator,
            link: DmaLink::new(),
            dispatcher: Dispatcher::new(),
            data_ready: false,
            passes: 0,
            recoveries: 0,
        }
    }

    /// One main-loop pass.
    pub fn service(&mut self) {
        self.dispatcher.begin_pass(&self.stepgen, self.link.tx_mut());

        if std::mem::take(&mut self.data_ready) {
            let rx = *self.link.rx();
            let tag = self.dispatcher.dispatch(
                &rx,
                self.link.tx_mut(),
                &self.stepgen,
                &mut self.board,
            );
            if matches!(tag, Some(CommandTag::Reset | CommandTag::Config)) {
                debug!(command = ?tag, "board reset by host");
            }
        }

        let events = self.link.take_events();
        if events.half {
            self.link.write_canary();
        }
        if events.full {
            self.data_ready = true;
        }

        if self.link.supervise() == LinkHealth::Recovery {
            self.recover_link();
        }

        let period = if self.link.is_active() {
            LED_PERIOD_ACTIVE
        } else {
            LED_PERIOD_IDLE
        };
        if self.passes % period == 0 {
            self.board.toggle_led();
        }
        self.passes += 1;

        self.board.kick_watchdog();
    }

    fn recover_link(&mut self) {
        self.recoveries += 1;
        warn!(recoveries = self.recoveries, "link silent, reinitializing transport");
        self.board.abort_transfers();
        self.board.reinit_transport();
        self.link.restart();
        self.data_ready = false;
        reset_board(&self.stepgen, &mut self.board);
    }

    /// One full-duplex exchange driven by the bus master.
    pub fn exchange(&mut self, incoming: &Frame) -> Frame {
        self.link.exchange(incoming)
    }

    /// One step timer interrupt.
    pub fn isr_tick(&mut self)
    where
        B: StepOutputs,
    {
        self.generator.tick(&mut self.board);
    }

    /// Board access.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Mutable board access.
    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Step generator mailboxes.
    pub fn stepgen(&self) -> &Arc<StepgenShared> {
        &self.stepgen
    }

    /// Link buffers and countdown.
    pub fn link(&self) -> &DmaLink {
        &self.link
    }

    /// Dispatcher state.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Main-loop passes so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Link recoveries so far.
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }
}
