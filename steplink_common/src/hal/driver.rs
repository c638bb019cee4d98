//! HAL traits and error types.
//!
//! This module defines:
//! - `LinkTransport` trait - Host side of one full-duplex frame exchange
//! - `BoardHal` trait - Device peripherals used by the firmware main loop
//! - `StepOutputs` trait - Step/direction pins driven from the step interrupt
//! - `HalError` enum - Error types for HAL operations

use crate::protocol::{Frame, InputBits, OutputBits};
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// `finish_exchange` called without a started exchange
    #[error("No exchange in progress")]
    NoExchangePending,
}

/// Host side of the synchronous serial link.
///
/// One exchange clocks a frame out and a frame in at the same time. The host
/// starts an exchange without waiting for it and collects the received frame
/// later, which lets the transfer overlap with other work in the cycle.
///
/// # Timing Contracts
///
/// | Operation | Max Duration | RT Constraint |
/// |-----------|--------------|---------------|
/// | `start_exchange()` | a few µs | **HARD** (called every cycle) |
/// | `finish_exchange()` | one frame time | **HARD** |
/// | `shutdown()` | 1 second | None (post-RT) |
pub trait LinkTransport: Send {
    /// Returns the transport's identifier (e.g., "loopback").
    fn name(&self) -> &'static str;

    /// Begin clocking `tx` out. Must not block on the transfer itself.
    fn start_exchange(&mut self, tx: &Frame) -> Result<(), HalError>;

    /// Wait for the exchange started last and return the received frame.
    ///
    /// # Errors
    /// Returns `HalError::NoExchangePending` if nothing was started.
    fn finish_exchange(&mut self) -> Result<Frame, HalError>;

    /// Release the link. Default: no-op.
    fn shutdown(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}

/// Step and direction pins, driven only from the step interrupt.
pub trait StepOutputs {
    /// Drive the direction pin of `axis` (`true` = positive).
    fn set_direction(&mut self, axis: usize, positive: bool);

    /// Drive the step pin of `axis`.
    fn set_step(&mut self, axis: usize, high: bool);
}

/// Device peripherals used by the firmware main loop.
///
/// Peripheral bring-up (clocks, pin mapping, DMA channel setup) happens
/// before the firmware core is constructed and is not part of this trait.
pub trait BoardHal {
    /// Sample the raw digital inputs.
    fn read_inputs(&mut self) -> InputBits;

    /// Drive the enable outputs.
    fn write_outputs(&mut self, outputs: OutputBits);

    /// Write the PWM duty compare register.
    fn set_pwm_duty(&mut self, duty: u32);

    /// Write the PWM period register.
    fn set_pwm_period(&mut self, period: u32);

    /// Abort in-flight DMA transfers on both channels.
    fn abort_transfers(&mut self);

    /// Reinitialize the serial peripheral and its DMA channels.
    fn reinit_transport(&mut self);

    /// Toggle the heartbeat LED.
    fn toggle_led(&mut self);

    /// Service the hardware watchdog.
    fn kick_watchdog(&mut self);
}
