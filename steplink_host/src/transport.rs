//! Host transports.
//!
//! Hardware ports implement [`LinkTransport`] for their serial peripheral.
//! [`SimulatedLink`] closes the loop against an in-process device core.

pub mod loopback;

pub use loopback::{SimTiming, SimulatedLink};
pub use steplink_common::hal::LinkTransport;
