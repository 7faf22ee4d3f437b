//! Pole-placement gain design for a second-order discrete plant.
//!
//! The plant `G(z) = (b₀z + b₁) / (z² + a₁z + a₂)` is closed with a
//! velocity-form PID
//!
//! ```text
//!         A·z² + B·z + C
//! C(z) = ────────────────      A = Kp + Ki + Kd,  B = −(Kp + 2Kd),  C = Kd
//!            z² − z
//! ```
//!
//! giving the quartic characteristic polynomial
//! `(z² + a₁z + a₂)(z² − z) + (b₀z + b₁)(A·z² + B·z + C)`.
//! Its z³, z² and z¹ coefficients are matched to a desired quartic built
//! from a dominant complex pair, a fast auxiliary pole and a free pole
//! near the origin. The constant term follows from the solution.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use standoff_common::control_unit::config::ControllerConfig;
use standoff_common::control_unit::plant::DiscreteTransferFunction;
use thiserror::Error;

/// Determinant magnitude below which the design system is treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Errors from the offline design tools.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TuningError {
    /// Plant cannot be written as `(b₀z + b₁) / (z² + a₁z + a₂)`.
    #[error("Unsupported plant: {0}")]
    UnsupportedPlant(String),

    /// Design parameters out of range.
    #[error("Invalid design parameters: {0}")]
    InvalidDesign(String),

    /// Coefficient-matching system has no unique solution.
    #[error("Design system is singular (det = {0:e})")]
    SingularSystem(f64),
}

// ─── Plant ──────────────────────────────────────────────────────────

/// Coefficients of a strictly proper second-order plant with monic denominator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondOrderPlant {
    pub b0: f64,
    pub b1: f64,
    pub a1: f64,
    pub a2: f64,
    /// Sample period [s].
    pub sample_period: f64,
}

impl TryFrom<&DiscreteTransferFunction> for SecondOrderPlant {
    type Error = TuningError;

    fn try_from(tf: &DiscreteTransferFunction) -> Result<Self, Self::Error> {
        tf.validate()
            .map_err(|e| TuningError::UnsupportedPlant(e.to_string()))?;
        if tf.order() != 2 {
            return Err(TuningError::UnsupportedPlant(format!(
                "denominator order {} (expected 2)",
                tf.order()
            )));
        }
        let num = tf.normalized_numerator();
        if num[0] != 0.0 {
            return Err(TuningError::UnsupportedPlant(
                "plant must be strictly proper".to_string(),
            ));
        }
        let den = tf.normalized_denominator();
        Ok(Self {
            b0: num[1],
            b1: num[2],
            a1: den[1],
            a2: den[2],
            sample_period: tf.sample_period,
        })
    }
}

impl SecondOrderPlant {
    /// Open-loop denominator `[1, a₁, a₂]`.
    pub fn denominator(&self) -> [f64; 3] {
        [1.0, self.a1, self.a2]
    }
}

// ─── Requirements ───────────────────────────────────────────────────

/// Time-domain requirements for the closed-loop step response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerformanceTargets {
    /// Maximum overshoot as a fraction (0.30 = 30 %).
    pub max_overshoot: f64,
    /// Maximum 2 % settling time [s].
    pub settling_time: f64,
}

impl PerformanceTargets {
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.max_overshoot > 0.0 && self.max_overshoot < 1.0) {
            return Err(TuningError::InvalidDesign(format!(
                "max_overshoot {} must be in (0, 1)",
                self.max_overshoot
            )));
        }
        if !(self.settling_time > 0.0 && self.settling_time.is_finite()) {
            return Err(TuningError::InvalidDesign(format!(
                "settling_time {} must be > 0",
                self.settling_time
            )));
        }
        Ok(())
    }

    /// Smallest damping ratio of a second-order pair meeting the overshoot
    /// bound: `|ln Mp| / sqrt(π² + ln² Mp)`.
    pub fn min_damping_ratio(&self) -> f64 {
        let ln_mp = self.max_overshoot.ln();
        ln_mp.abs() / (PI * PI + ln_mp * ln_mp).sqrt()
    }

    /// Smallest natural frequency [rad/s] settling in time at damping `zeta`:
    /// `4 / (ζ·ts)`.
    pub fn min_natural_frequency(&self, zeta: f64) -> f64 {
        4.0 / (zeta * self.settling_time)
    }
}

// ─── Pole placement ─────────────────────────────────────────────────

/// Desired closed-loop pole layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolePlacement {
    /// Damping ratio ζ of the dominant pair, `0 < ζ < 1`.
    pub damping_ratio: f64,
    /// Natural frequency ωn of the dominant pair [rad/s].
    pub natural_frequency: f64,
    /// Auxiliary real pole sits at `m` times the dominant decay rate.
    pub auxiliary_pole_multiple: f64,
    /// Fourth pole, placed directly in the z-plane.
    pub origin_pole: f64,
}

/// Dominant pair `r·e^{±jθ}` plus the two real poles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesiredPoles {
    pub radius: f64,
    pub angle: f64,
    pub auxiliary: f64,
    pub origin: f64,
}

impl DesiredPoles {
    /// Monic quartic `(z² − 2r·cosθ·z + r²)(z − z₃)(z − z₄)`.
    pub fn characteristic(&self) -> [f64; 5] {
        let pair = [1.0, -2.0 * self.radius * self.angle.cos(), self.radius * self.radius];
        let cubic = poly_mul_linear(&pair, self.auxiliary);
        let quartic = poly_mul_linear(&cubic, self.origin);
        [quartic[0], quartic[1], quartic[2], quartic[3], quartic[4]]
    }
}

/// Multiply a polynomial by `(z − root)`.
fn poly_mul_linear(poly: &[f64], root: f64) -> Vec<f64> {
    let mut out = vec![0.0; poly.len() + 1];
    for (i, c) in poly.iter().enumerate() {
        out[i] += c;
        out[i + 1] -= c * root;
    }
    out
}

impl PolePlacement {
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.damping_ratio > 0.0 && self.damping_ratio < 1.0) {
            return Err(TuningError::InvalidDesign(format!(
                "damping_ratio {} must be in (0, 1)",
                self.damping_ratio
            )));
        }
        if !(self.natural_frequency > 0.0 && self.natural_frequency.is_finite()) {
            return Err(TuningError::InvalidDesign(format!(
                "natural_frequency {} must be > 0",
                self.natural_frequency
            )));
        }
        if !(self.auxiliary_pole_multiple > 0.0 && self.auxiliary_pole_multiple.is_finite()) {
            return Err(TuningError::InvalidDesign(format!(
                "auxiliary_pole_multiple {} must be > 0",
                self.auxiliary_pole_multiple
            )));
        }
        if !(self.origin_pole.abs() < 1.0) {
            return Err(TuningError::InvalidDesign(format!(
                "origin_pole {} must lie inside the unit circle",
                self.origin_pole
            )));
        }
        Ok(())
    }

    /// Map the s-plane layout to z-plane poles at sample period `ts`.
    pub fn poles(&self, ts: f64) -> DesiredPoles {
        let sigma = self.damping_ratio * self.natural_frequency;
        let omega_d = self.natural_frequency * (1.0 - self.damping_ratio.powi(2)).sqrt();
        DesiredPoles {
            radius: (-sigma * ts).exp(),
            angle: omega_d * ts,
            auxiliary: (-ts * sigma * self.auxiliary_pole_multiple).exp(),
            origin: self.origin_pole,
        }
    }
}

// ─── Gains ──────────────────────────────────────────────────────────

/// Gains produced by [`design_gains`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DesignedGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl DesignedGains {
    /// Velocity-form coefficients `(A, B, C)`.
    #[inline]
    pub fn velocity_form(&self) -> (f64, f64, f64) {
        (
            self.kp + self.ki + self.kd,
            -(self.kp + 2.0 * self.kd),
            self.kd,
        )
    }

    /// Controller configuration carrying these gains over `base`.
    pub fn apply_to(&self, base: &ControllerConfig) -> ControllerConfig {
        ControllerConfig {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            ..*base
        }
    }
}

impl From<&ControllerConfig> for DesignedGains {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
        }
    }
}

/// Solve for PID gains placing the closed-loop poles of `plant`.
///
/// # Errors
/// - `InvalidDesign` if `placement` is out of range
/// - `SingularSystem` if the plant makes the coefficient match degenerate
pub fn design_gains(
    plant: &SecondOrderPlant,
    placement: &PolePlacement,
) -> Result<DesignedGains, TuningError> {
    placement.validate()?;
    let desired = placement.poles(plant.sample_period).characteristic();
    let SecondOrderPlant { b0, b1, a1, a2, .. } = *plant;

    // Unknowns ordered [Kp, Ki, Kd].
    let m = [
        [b0, b0, b0],
        [b1 - b0, b1, b1 - 2.0 * b0],
        [-b1, 0.0, b0 - 2.0 * b1],
    ];
    let rhs = [
        desired[1] - (a1 - 1.0),
        desired[2] - (a2 - a1),
        desired[3] + a2,
    ];
    let [kp, ki, kd] = solve3(&m, &rhs)?;
    Ok(DesignedGains { kp, ki, kd })
}

/// Characteristic polynomial of the plant closed with `gains`, highest
/// power first.
pub fn closed_loop_characteristic(plant: &SecondOrderPlant, gains: &DesignedGains) -> [f64; 5] {
    let (a, b, c) = gains.velocity_form();
    let SecondOrderPlant { b0, b1, a1, a2, .. } = *plant;
    [
        1.0,
        a1 - 1.0 + b0 * a,
        a2 - a1 + b0 * b + b1 * a,
        -a2 + b0 * c + b1 * b,
        b1 * c,
    ]
}

/// Cramer's rule on a 3×3 system.
fn solve3(m: &[[f64; 3]; 3], rhs: &[f64; 3]) -> Result<[f64; 3], TuningError> {
    let det = det3(m);
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return Err(TuningError::SingularSystem(det));
    }
    let mut out = [0.0; 3];
    for (col, slot) in out.iter_mut().enumerate() {
        let mut mc = *m;
        for (row, value) in rhs.iter().enumerate() {
            mc[row][col] = *value;
        }
        *slot = det3(&mc) / det;
    }
    Ok(out)
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

// ─── Tests ──────────────────────────────────────────────────────────
