//! Control-unit shared types.
//!
//! Everything the control unit exchanges with other crates lives here:
//! tuning and safety parameters, the loop phase enum, diagnostic events
//! and discrete plant models used by the offline design tools.

pub mod config;
pub mod event;
pub mod plant;
pub mod state;
