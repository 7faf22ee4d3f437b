//! Discrete PID with exponential derivative smoothing and conditional
//! integration (anti-windup).
//!
//! The step is total: finite inputs always yield an output inside
//! `[output_min, output_max]`, which the configuration keeps inside `[-1, 1]`.

use standoff_common::control_unit::config::ControllerConfig;
use static_assertions::assert_impl_all;

/// History carried between controller steps.
///
/// Owned by a single control session. Must be reset (via
/// [`ControllerState::reset`]) whenever control authority is re-acquired,
/// so integral and derivative history cannot leak across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerState {
    /// Error of the previous step.
    previous_error: f64,
    /// Integral accumulator, `Σ error·Ts` over committed steps.
    integral_accumulator: f64,
    /// Smoothed derivative of the error.
    filtered_derivative: f64,
}

assert_impl_all!(ControllerState: Copy, Send, Sync, Default);

impl ControllerState {
    /// State with explicit history, e.g. to resume from a snapshot.
    pub const fn from_parts(
        previous_error: f64,
        integral_accumulator: f64,
        filtered_derivative: f64,
    ) -> Self {
        Self {
            previous_error,
            integral_accumulator,
            filtered_derivative,
        }
    }

    #[inline]
    pub const fn previous_error(&self) -> f64 {
        self.previous_error
    }

    #[inline]
    pub const fn integral_accumulator(&self) -> f64 {
        self.integral_accumulator
    }

    #[inline]
    pub const fn filtered_derivative(&self) -> f64 {
        self.filtered_derivative
    }

    /// Reset all internal state to zero.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when every field is exactly zero.
    #[inline]
    pub fn is_zeroed(&self) -> bool {
        self.previous_error == 0.0
            && self.integral_accumulator == 0.0
            && self.filtered_derivative == 0.0
    }
}

/// Free-function form of [`ControllerState::reset`].
#[inline]
pub fn reset(state: &mut ControllerState) {
    state.reset();
}

/// Compute one control sample.
///
/// # Arguments
/// - `reference`: Setpoint, same unit as `measurement`.
/// - `measurement`: Current sensor reading.
/// - `state`: Controller history, mutated exactly once.
/// - `config`: Gains, sample period and output bounds.
///
/// # Returns
/// Saturated output in `[config.output_min, config.output_max]`.
/// A non-positive sample period yields 0.0 and leaves `state` untouched.
/// History fields only ever take finite values.
#[inline]
pub fn evaluate(
    reference: f64,
    measurement: f64,
    state: &mut ControllerState,
    config: &ControllerConfig,
) -> f64 {
    let ts = config.sample_period;
    if ts <= 0.0 {
        return 0.0;
    }

    let error = reference - measurement;

    // ── D term (exponential smoothing) ──────────────────────
    let raw_derivative = (error - state.previous_error) / ts;
    let alpha = config.derivative_filter_alpha;
    let filtered = alpha * state.filtered_derivative + (1.0 - alpha) * raw_derivative;
    // An overflowed sample would poison the filter for every later step.
    if filtered.is_finite() {
        state.filtered_derivative = filtered;
    }

    // ── I term (candidate, not yet committed) ───────────────
    let integral_candidate = state.integral_accumulator + error * ts;

    let raw_output = config.kp * error
        + config.ki * integral_candidate
        + config.kd * state.filtered_derivative;

    // NaN only arises from overflowing inputs; hold the actuator at rest.
    let output = if raw_output.is_nan() {
        0.0
    } else {
        raw_output.clamp(config.output_min, config.output_max)
    };

    // ── Anti-windup gate ────────────────────────────────────
    let saturated_high = raw_output > config.output_max;
    let saturated_low = raw_output < config.output_min;
    let unsaturated = !saturated_high && !saturated_low && !raw_output.is_nan();
    let gate_open =
        unsaturated || (saturated_high && error < 0.0) || (saturated_low && error > 0.0);
    if gate_open && integral_candidate.is_finite() {
        state.integral_accumulator = integral_candidate;
    }

    if error.is_finite() {
        state.previous_error = error;
    }

    output
}

// ─── Tests ──────────────────────────────────────────────────────────
