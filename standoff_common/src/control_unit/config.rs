//! Configuration structures for the control unit.
//!
//! All sections deserialize from TOML with `#[serde(default)]` so a file only
//! needs to name what differs from the deployed firmware tuning. Numeric
//! parameters have `MIN`/`MAX` bounds checked by `validate()`.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

// ─── Defaults (deployed firmware tuning) ────────────────────────────

/// Control period [s] (10 ms).
pub const DEFAULT_SAMPLE_PERIOD: f64 = 0.01;
/// Proportional gain.
pub const DEFAULT_KP: f64 = 0.004374066092882029;
/// Integral gain.
pub const DEFAULT_KI: f64 = 0.00844489305954211;
/// Derivative gain.
pub const DEFAULT_KD: f64 = 2.2236406200986116;
/// Derivative low-pass coefficient (close to 1 = heavy smoothing).
pub const DEFAULT_DERIVATIVE_FILTER_ALPHA: f64 = 0.9999999999999;
/// Interlock threshold [cm].
pub const DEFAULT_MINIMUM_SAFE_DISTANCE: f64 = 30.0;
/// Distance to hold from the obstacle [cm].
pub const DEFAULT_REFERENCE_SETPOINT: f64 = 100.0;
/// Ranging limit of the ultrasonic sensor [cm]; farther readings are echoes or glitches.
pub const DEFAULT_MAXIMUM_PLAUSIBLE_DISTANCE: f64 = 400.0;
/// Full-scale motor command (8-bit PWM).
pub const DEFAULT_MAX_COMMAND: i32 = 255;

/// Normalized controller output bounds.
pub const OUTPUT_LIMIT_MIN: f64 = -1.0;
pub const OUTPUT_LIMIT_MAX: f64 = 1.0;

/// Accepted control period range [s].
pub const SAMPLE_PERIOD_MAX: f64 = 1.0;

/// Accepted full-scale motor command range.
pub const MAX_COMMAND_MIN: i32 = 1;
pub const MAX_COMMAND_MAX: i32 = i16::MAX as i32;

// ─── Controller ─────────────────────────────────────────────────────

/// Immutable PID tuning, fixed for the lifetime of the process.
///
/// # TOML Example
///
/// ```toml
/// [controller]
/// sample_period = 0.01
/// kp = 0.004374066092882029
/// ki = 0.00844489305954211
/// kd = 2.2236406200986116
/// derivative_filter_alpha = 0.9999999999999
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Control period [s].
    pub sample_period: f64,
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Exponential smoothing coefficient of the derivative term, `0 < alpha < 1`.
    pub derivative_filter_alpha: f64,
    /// Lower saturation bound of the normalized output.
    pub output_min: f64,
    /// Upper saturation bound of the normalized output.
    pub output_max: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sample_period: DEFAULT_SAMPLE_PERIOD,
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            kd: DEFAULT_KD,
            derivative_filter_alpha: DEFAULT_DERIVATIVE_FILTER_ALPHA,
            output_min: OUTPUT_LIMIT_MIN,
            output_max: OUTPUT_LIMIT_MAX,
        }
    }
}

impl ControllerConfig {
    /// Validate parameter bounds.
    ///
    /// Output bounds must stay inside `[-1, 1]` so the normalized output
    /// guarantee holds for any accepted configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_period > 0.0 && self.sample_period <= SAMPLE_PERIOD_MAX) {
            return Err(invalid(format!(
                "sample_period {} out of range (0, {SAMPLE_PERIOD_MAX}]",
                self.sample_period
            )));
        }
        for (name, gain) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !gain.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {gain}")));
            }
        }
        if !(self.derivative_filter_alpha > 0.0 && self.derivative_filter_alpha < 1.0) {
            return Err(invalid(format!(
                "derivative_filter_alpha {} must satisfy 0 < alpha < 1",
                self.derivative_filter_alpha
            )));
        }
        if !(self.output_min >= OUTPUT_LIMIT_MIN
            && self.output_max <= OUTPUT_LIMIT_MAX
            && self.output_min < self.output_max)
        {
            return Err(invalid(format!(
                "output bounds [{}, {}] must satisfy {OUTPUT_LIMIT_MIN} <= min < max <= {OUTPUT_LIMIT_MAX}",
                self.output_min, self.output_max
            )));
        }
        Ok(())
    }

    /// Control period in whole microseconds (tick admission resolution).
    #[inline]
    pub fn sample_period_us(&self) -> u64 {
        (self.sample_period * 1_000_000.0).round() as u64
    }
}

// ─── Safety ─────────────────────────────────────────────────────────

/// Safety interlock threshold and the regulated setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafetyPolicy {
    /// Any measurement strictly below this trips the interlock [cm].
    pub minimum_safe_distance: f64,
    /// Distance the controller regulates to [cm].
    pub reference_setpoint: f64,
    /// Any measurement strictly above this is implausible and trips [cm].
    pub maximum_plausible_distance: f64,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            minimum_safe_distance: DEFAULT_MINIMUM_SAFE_DISTANCE,
            reference_setpoint: DEFAULT_REFERENCE_SETPOINT,
            maximum_plausible_distance: DEFAULT_MAXIMUM_PLAUSIBLE_DISTANCE,
        }
    }
}

impl SafetyPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.minimum_safe_distance.is_finite() && self.minimum_safe_distance >= 0.0) {
            return Err(invalid(format!(
                "minimum_safe_distance {} must be finite and >= 0",
                self.minimum_safe_distance
            )));
        }
        if !(self.reference_setpoint.is_finite()
            && self.reference_setpoint > self.minimum_safe_distance)
        {
            return Err(invalid(format!(
                "reference_setpoint {} must be finite and above minimum_safe_distance {}",
                self.reference_setpoint, self.minimum_safe_distance
            )));
        }
        if !(self.maximum_plausible_distance.is_finite()
            && self.maximum_plausible_distance > self.reference_setpoint)
        {
            return Err(invalid(format!(
                "maximum_plausible_distance {} must be finite and above reference_setpoint {}",
                self.maximum_plausible_distance, self.reference_setpoint
            )));
        }
        Ok(())
    }
}

// ─── Actuator ───────────────────────────────────────────────────────

/// Mapping from the normalized controller output to the motor's native range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorConfig {
    /// Command magnitude for a normalized output of 1.0.
    pub max_command: i32,
    /// Negate the command: positive controller output drives backward.
    pub invert_direction: bool,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            max_command: DEFAULT_MAX_COMMAND,
            invert_direction: true,
        }
    }
}

impl ActuatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_command < MAX_COMMAND_MIN || self.max_command > MAX_COMMAND_MAX {
            return Err(invalid(format!(
                "max_command {} out of range [{MAX_COMMAND_MIN}, {MAX_COMMAND_MAX}]",
                self.max_command
            )));
        }
        Ok(())
    }
}

// ─── Telemetry ──────────────────────────────────────────────────────

/// Periodic telemetry sent to the diagnostics sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Emit one sample every N executed control cycles (0 = disabled).
    pub interval_ticks: u32,
}

impl TelemetryConfig {
    /// Whether the given executed-cycle count is a telemetry cycle.
    #[inline]
    pub const fn is_due(&self, executed_cycles: u64) -> bool {
        self.interval_ticks != 0 && executed_cycles % self.interval_ticks as u64 == 0
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

// ─── Tests ──────────────────────────────────────────────────────────
