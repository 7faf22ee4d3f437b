//! Hardware/platform boundary consumed by the control loop.
//!
//! - [`driver`] - Collaborator capability traits and `HalError`
//! - [`time`] - Fixed-period tick admission

pub mod driver;
pub mod time;
