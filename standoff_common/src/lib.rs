//! Standoff Common Library
//!
//! Shared types for every crate of the standoff distance controller
//! workspace: configuration loading, controller and safety parameters,
//! loop phase, diagnostic events, plant models and the capability traits
//! the control loop consumes from the hardware/platform boundary.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`control_unit`] - Control-unit parameters, state and event types
//! - [`hal`] - Collaborator capability traits and tick admission
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use standoff_common::prelude::*;
//!
//! let config = ControllerConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod control_unit;
pub mod hal;
pub mod prelude;
