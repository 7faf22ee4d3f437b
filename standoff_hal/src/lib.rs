//! # Standoff HAL Library
//!
//! Platform collaborators for the standoff control loop that run without
//! hardware. Drivers implement the capability traits defined in
//! `standoff_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`drivers`] - Collaborator implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      standoff_hal                            │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐   │
//! │  │ SimulatedRig  │   │  LatchButton  │   │ Scripted/     │   │
//! │  │ sensor/motor/ │   │  (RunControl) │   │ Recording     │   │
//! │  │ clock handles │   │               │   │ test doubles  │   │
//! │  └───────┬───────┘   └───────┬───────┘   └───────┬───────┘   │
//! │          └───────────────────┼───────────────────┘           │
//! │                              ▼                               │
//! │            Sensor / Actuator / TimeBase / RunControl /       │
//! │            Diagnostics  (standoff_common::hal::driver)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod drivers;

pub use crate::drivers::simulation::{LatchButton, RigConfig, SimulatedRig};
