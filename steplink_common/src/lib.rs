//! steplink Common Library
//!
//! This crate provides the pieces shared by the host driver and the device
//! firmware of the steplink split stepper controller.
//!
//! # Module Structure
//!
//! - [`consts`] - Build-time constants (axis count, frame size, DDS scaling)
//! - [`protocol`] - Wire protocol: command tags, frames, typed commands, I/O bits
//! - [`hal`] - Hardware abstraction traits injected into host and firmware cores
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use steplink_common::protocol::{Command, CommandTag};
//!
//! let frame = Command::Reset.encode();
//! assert_eq!(frame.tag(), Some(CommandTag::Reset));
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod protocol;
