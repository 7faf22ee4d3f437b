//! Collaborator capability traits and error types.
//!
//! The control loop talks to the platform only through these traits:
//!
//! | Trait | Capability |
//! |-------|------------|
//! | [`Sensor`] | distance reading in the controller's unit |
//! | [`Actuator`] | signed drive command, immediate stop |
//! | [`TimeBase`] | fixed-period tick admission |
//! | [`RunControl`] | operator start/stop intent |
//! | [`Diagnostics`] | status and safety event sink |
//!
//! # Timing Contracts
//!
//! Every call is synchronous and must complete well within one sample
//! period. None of them may block waiting on another execution context.

use thiserror::Error;

use crate::control_unit::event::DiagnosticEvent;

/// Error types for collaborator operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HalError {
    /// Sensor read failed.
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// Actuator rejected a command.
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// Diagnostics sink could not accept the event.
    #[error("Diagnostics error: {0}")]
    Diagnostics(String),

    /// Collaborator initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),
}

/// Ranging sensor.
pub trait Sensor {
    /// Current distance to the obstacle, already normalized to the
    /// controller's unit.
    fn read_distance(&mut self) -> Result<f64, HalError>;
}

/// Motor drive.
pub trait Actuator {
    /// Drive with a signed command; positive is forward.
    fn drive(&mut self, command: i32) -> Result<(), HalError>;

    /// Halt motion immediately and synchronously.
    fn stop(&mut self) -> Result<(), HalError>;
}

/// Fixed-period tick admission.
pub trait TimeBase {
    /// True at most once per elapsed sample period. Missed periods are not
    /// queued.
    fn tick_due(&mut self) -> bool;

    /// A new session begins: the next `tick_due` must admit.
    fn restart(&mut self) {}
}

/// Operator start/stop input.
pub trait RunControl {
    /// Sample the external input and update the run intent.
    fn poll_start_stop(&mut self);

    /// Current run intent.
    fn is_running(&self) -> bool;
}

/// Status and safety event sink.
///
/// Failures are reported back to the caller, which must never let them
/// block or fail the control path.
pub trait Diagnostics {
    fn report(&mut self, event: &DiagnosticEvent) -> Result<(), HalError>;
}

impl<D: Diagnostics + ?Sized> Diagnostics for Box<D> {
    fn report(&mut self, event: &DiagnosticEvent) -> Result<(), HalError> {
        (**self).report(event)
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn report(&mut self, _event: &DiagnosticEvent) -> Result<(), HalError> {
        Ok(())
    }
}
