//! Simulated board.
//!
//! Records every peripheral write so tests can assert on pin and register
//! state, and lets tests drive the digital inputs.

mod board;

pub use board::SimBoard;
