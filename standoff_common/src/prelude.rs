//! Prelude module for common re-exports.
//!
//! ```rust
//! use standoff_common::prelude::*;
//! ```

use static_assertions::assert_impl_all;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Control Unit ───────────────────────────────────────────────────
pub use crate::control_unit::config::{
    ActuatorConfig, ControllerConfig, SafetyPolicy, TelemetryConfig,
};
pub use crate::control_unit::event::{DiagnosticEvent, SafetyTrip};
pub use crate::control_unit::plant::DiscreteTransferFunction;
pub use crate::control_unit::state::LoopPhase;

// ─── Collaborators ──────────────────────────────────────────────────
pub use crate::hal::driver::{
    Actuator, Diagnostics, HalError, NullDiagnostics, RunControl, Sensor, TimeBase,
};
pub use crate::hal::time::PeriodGate;

assert_impl_all!(ControllerConfig: Copy, Send, Sync, Default);
assert_impl_all!(SafetyPolicy: Copy, Send, Sync, Default);
assert_impl_all!(DiagnosticEvent: Copy, Send);
