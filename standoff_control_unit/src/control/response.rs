//! Closed-loop unit-step simulation for design validation.
//!
//! Runs the plant difference equation against the velocity-form PID with
//! zero initial conditions and no output saturation:
//!
//! ```text
//! y[k] = −a₁·y[k−1] − a₂·y[k−2] + b₀·u[k−1] + b₁·u[k−2]
//! e[k] = 1 − y[k]
//! u[k] = u[k−1] + A·e[k] + B·e[k−1] + C·e[k−2]
//! ```

use serde::Serialize;

use super::tuning::{DesignedGains, SecondOrderPlant};

/// Width of the settling band, relative to the final value.
pub const SETTLING_BAND: f64 = 0.02;

/// Sampled closed-loop response to a unit step in the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResponse {
    /// Plant output `y[k]`.
    pub output: Vec<f64>,
    /// Controller output `u[k]`.
    pub control: Vec<f64>,
    /// Sample period [s].
    pub sample_period: f64,
}

/// Summary of a [`StepResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepMetrics {
    /// Largest output sample.
    pub peak: f64,
    /// Last output sample.
    pub final_value: f64,
    /// Peak excess over the final value [%]. 0 when the response never exceeds it.
    pub overshoot_percent: f64,
    /// Time after which the output stays within the settling band [s].
    pub settling_time: f64,
    /// Largest controller effort magnitude.
    pub peak_control: f64,
}

/// Simulate `samples` steps of the closed loop.
pub fn step_response(
    plant: &SecondOrderPlant,
    gains: &DesignedGains,
    samples: usize,
) -> StepResponse {
    let (a, b, c) = gains.velocity_form();
    let mut output = Vec::with_capacity(samples);
    let mut control = Vec::with_capacity(samples);

    // (k−1, k−2) history
    let (mut y1, mut y2) = (0.0, 0.0);
    let (mut u1, mut u2) = (0.0, 0.0);
    let (mut e1, mut e2) = (0.0, 0.0);

    for _ in 0..samples {
        let y = -plant.a1 * y1 - plant.a2 * y2 + plant.b0 * u1 + plant.b1 * u2;
        let e = 1.0 - y;
        let u = u1 + a * e + b * e1 + c * e2;

        output.push(y);
        control.push(u);

        (y2, y1) = (y1, y);
        (u2, u1) = (u1, u);
        (e2, e1) = (e1, e);
    }

    StepResponse {
        output,
        control,
        sample_period: plant.sample_period,
    }
}

impl StepResponse {
    /// Peak, final value, overshoot and 2 % settling time.
    ///
    /// Returns `None` for an empty response.
    pub fn metrics(&self) -> Option<StepMetrics> {
        let final_value = *self.output.last()?;
        let peak = self.output.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let overshoot_percent = if final_value != 0.0 && peak > final_value {
            (peak - final_value) / final_value.abs() * 100.0
        } else {
            0.0
        };
        let band = SETTLING_BAND * final_value.abs();
        let settling_time = self
            .output
            .iter()
            .rposition(|y| (y - final_value).abs() > band)
            .map_or(0.0, |idx| (idx + 1) as f64 * self.sample_period);
        let peak_control = self.control.iter().fold(0.0_f64, |acc, u| acc.max(u.abs()));

        Some(StepMetrics {
            peak,
            final_value,
            overshoot_percent,
            settling_time,
            peak_control,
        })
    }
}
