//! Discrete-time plant models.
//!
//! A plant is described by a z-domain transfer function
//!
//! ```text
//!         n₀·zᵐ + n₁·zᵐ⁻¹ + … + nₘ
//! G(z) = ─────────────────────────
//!         d₀·zⁿ + d₁·zⁿ⁻¹ + … + dₙ
//! ```
//!
//! with coefficients stored highest power first.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Identified numerator of the platform's distance dynamics (ZOH, Ts = 10 ms).
pub const REFERENCE_NUMERATOR: [f64; 2] = [0.48571, -0.16194];
/// Identified denominator; open-loop poles near 1.0219 and 0.9771.
pub const REFERENCE_DENOMINATOR: [f64; 3] = [1.0, -1.9989997, 0.9985011];

/// z-domain transfer function with a fixed sample period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscreteTransferFunction {
    /// Numerator coefficients, highest power first.
    pub numerator: Vec<f64>,
    /// Denominator coefficients, highest power first.
    pub denominator: Vec<f64>,
    /// Sample period [s].
    pub sample_period: f64,
}

impl DiscreteTransferFunction {
    pub fn new(numerator: Vec<f64>, denominator: Vec<f64>, sample_period: f64) -> Self {
        Self {
            numerator,
            denominator,
            sample_period,
        }
    }

    /// The identified distance plant at Ts = 10 ms.
    pub fn reference() -> Self {
        Self::new(
            REFERENCE_NUMERATOR.to_vec(),
            REFERENCE_DENOMINATOR.to_vec(),
            0.01,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.numerator.is_empty() || self.denominator.is_empty() {
            return Err(ConfigError::ValidationError(
                "plant numerator and denominator must not be empty".to_string(),
            ));
        }
        if self
            .numerator
            .iter()
            .chain(self.denominator.iter())
            .any(|c| !c.is_finite())
        {
            return Err(ConfigError::ValidationError(
                "plant coefficients must be finite".to_string(),
            ));
        }
        if self.denominator[0] == 0.0 {
            return Err(ConfigError::ValidationError(
                "plant denominator leading coefficient must be non-zero".to_string(),
            ));
        }
        if !(self.sample_period > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "plant sample_period {} must be > 0",
                self.sample_period
            )));
        }
        if self.numerator_degree() > self.order() {
            return Err(ConfigError::ValidationError(
                "plant must be proper (numerator degree <= denominator degree)".to_string(),
            ));
        }
        Ok(())
    }

    /// Denominator degree.
    #[inline]
    pub fn order(&self) -> usize {
        self.denominator.len().saturating_sub(1)
    }

    /// Numerator degree, ignoring leading zeros.
    pub fn numerator_degree(&self) -> usize {
        let leading_zeros = self.numerator.iter().take_while(|c| **c == 0.0).count();
        self.numerator.len().saturating_sub(leading_zeros + 1)
    }

    /// Numerator without leading zeros, padded on the left to `order()` + 1
    /// entries and divided by the denominator's leading coefficient.
    pub fn normalized_numerator(&self) -> Vec<f64> {
        let lead = self.denominator[0];
        let stripped: Vec<f64> = self
            .numerator
            .iter()
            .skip_while(|c| **c == 0.0)
            .map(|c| c / lead)
            .collect();
        let width = self.order() + 1;
        let mut padded = vec![0.0; width.saturating_sub(stripped.len())];
        padded.extend(stripped);
        padded
    }

    /// Monic denominator.
    pub fn normalized_denominator(&self) -> Vec<f64> {
        let lead = self.denominator[0];
        self.denominator.iter().map(|c| c / lead).collect()
    }

    /// Steady-state gain `G(1)`. `None` for a pole at z = 1.
    pub fn dc_gain(&self) -> Option<f64> {
        let den: f64 = self.denominator.iter().sum();
        if den.abs() < f64::EPSILON {
            return None;
        }
        Some(self.numerator.iter().sum::<f64>() / den)
    }
}
