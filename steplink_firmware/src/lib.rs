//! # steplink firmware core
//!
//! Device side of the steplink split stepper controller, written against the
//! `BoardHal` and `StepOutputs` traits so it runs unchanged on a simulated
//! board.
//!
//! # Module Structure
//!
//! - [`stepgen`] - DDS step pulse generator and its interrupt mailboxes
//! - [`transport`] - DMA buffer pair, completion events, silence countdown
//! - [`dispatcher`] - Command dispatch and deferred position report
//! - [`device`] - Main loop tying the pieces together
//! - [`drivers`] - Board implementations
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      steplink_firmware                        │
//! │  ┌────────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │  │  DmaLink   │◄─►│ Device       │◄─►│ Dispatcher          │  │
//! │  │ (rx / tx)  │   │ (main loop)  │   │ (CM1/CM2/CFG/...)   │  │
//! │  └────────────┘   └──────┬───────┘   └─────────────────────┘  │
//! │                          │ atomics                            │
//! │                          ▼                                    │
//! │                 ┌─────────────────┐                           │
//! │                 │ StepGenerator   │ (timer interrupt)         │
//! │                 └─────────────────┘                           │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod device;
pub mod dispatcher;
pub mod drivers;
pub mod stepgen;
pub mod transport;

pub use crate::device::Device;
pub use crate::drivers::simulation::SimBoard;
pub use crate::stepgen::{StepGenerator, StepgenShared};
