//! Hardware abstraction layer traits and errors.
//!
//! The host and firmware cores never touch registers directly. Everything
//! board-specific goes through the traits in [`driver`], which lets the
//! planner, protocol and supervision logic run unchanged against a
//! simulated board in tests.

pub mod driver;

pub use driver::{BoardHal, HalError, LinkTransport, StepOutputs};
