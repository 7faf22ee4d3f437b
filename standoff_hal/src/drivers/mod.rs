//! Collaborator implementations.
//!
//! - [`simulation`] - Software rig, operator button and test doubles
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the traits from `standoff_common::hal::driver` it provides
//! 3. Re-export the entry type from this module

pub mod simulation;
