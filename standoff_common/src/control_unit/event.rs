//! Safety trip reasons and diagnostic events reported by the control loop.

use serde::Serialize;

/// Why the safety interlock forced the actuator off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SafetyTrip {
    /// Measured distance below the configured minimum.
    TooClose {
        /// Measured distance [cm].
        distance: f64,
        /// Configured threshold [cm].
        minimum: f64,
    },
    /// Sensor returned a non-finite value or one beyond the plausibility ceiling.
    InvalidReading {
        /// Raw value as returned by the sensor.
        value: f64,
    },
    /// Sensor read failed.
    SensorFault,
    /// Actuator rejected a drive command.
    ActuatorFault,
}

impl std::fmt::Display for SafetyTrip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooClose { distance, minimum } => {
                write!(f, "distance {distance:.2} below minimum {minimum:.2}")
            }
            Self::InvalidReading { value } => write!(f, "implausible reading {value}"),
            Self::SensorFault => f.write_str("sensor fault"),
            Self::ActuatorFault => f.write_str("actuator fault"),
        }
    }
}

/// Structured event accepted by a diagnostics sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// Control session started (Idle → Running).
    Started,
    /// Operator stop (Running → Idle).
    Stopped,
    /// Operator re-armed after a safety stop (Halted → Idle).
    Rearmed,
    /// Safety interlock tripped (Running → Halted).
    SafetyStop {
        /// Trip reason.
        trip: SafetyTrip,
    },
    /// Periodic control sample.
    Telemetry {
        /// Measured distance [cm].
        measurement: f64,
        /// Regulated setpoint [cm].
        reference: f64,
        /// `reference - measurement`.
        error: f64,
        /// Saturated normalized output.
        output: f64,
        /// Command sent to the actuator.
        command: i32,
    },
}
