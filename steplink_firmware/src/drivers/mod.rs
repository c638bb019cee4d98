//! Board implementations of the HAL traits.
//!
//! - [`simulation`] - In-memory board for host-side testing and the loopback link
//!
//! A hardware port implements `BoardHal` and `StepOutputs` from
//! `steplink_common::hal` for its peripherals and hands the board to
//! [`crate::Device::new`].

pub mod simulation;
