//! Safety module root.
//!
//! Minimum-distance interlock evaluated before every control step.

pub mod interlock;
