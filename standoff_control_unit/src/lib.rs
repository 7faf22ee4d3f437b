//! # Standoff Control Unit Library
//!
//! Fixed-rate distance controller for a mobile platform. A discrete PID with
//! derivative smoothing and conditional-integration anti-windup regulates
//! the distance to an obstacle; a safety interlock checked before every
//! control step forces the motor off when the obstacle gets too close.
//!
//! ## Layers
//!
//! 1. **Controller** ([`control::pid`]): pure numeric step, no I/O
//! 2. **Safety interlock** ([`safety::interlock`]): per-tick verdict on the reading
//! 3. **LoopPhase** ([`state::machine`]): Idle / Running / Halted lifecycle
//! 4. **Control loop** ([`cycle`]): one transition function per tick, wiring
//!    the above to the collaborator traits of `standoff_common::hal::driver`
//!
//! ## Offline Design
//!
//! [`control::tuning`], [`control::stability`] and [`control::response`]
//! design and check PID gains for a second-order discrete plant. They run
//! off the control path, in the `standoff_tune` binary.

pub mod config;
pub mod control;
pub mod cycle;
pub mod diagnostics;
pub mod safety;
pub mod state;
