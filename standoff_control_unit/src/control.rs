//! Control engine root.
//!
//! Runtime: the PID step and the mapping of its normalized output to the
//! actuator's command range. Offline: gain design and closed-loop analysis.

pub mod output;
pub mod pid;
pub mod response;
pub mod stability;
pub mod tuning;
