//! TOML configuration loader with validation.
//!
//! Two files are understood:
//!
//! - the control-unit file (`config/standoff.toml`): `[shared]`,
//!   `[controller]`, `[safety]`, `[actuator]`, `[telemetry]` and the optional
//!   `[simulation]` rig used by the binary;
//! - the tuning file (`config/tune.toml`): `[shared]`, `[plant]`, `[design]`,
//!   `[targets]` for the offline design report.
//!
//! Every section except `[shared]` may be omitted and falls back to its
//! defaults. Validation runs after parsing and reports the first violation.

use std::path::Path;

use serde::Deserialize;
use standoff_common::config::{ConfigError, ConfigLoader, SharedConfig};
use standoff_common::control_unit::config::{
    ActuatorConfig, ControllerConfig, SafetyPolicy, TelemetryConfig,
};
use standoff_common::control_unit::plant::DiscreteTransferFunction;
use standoff_hal::drivers::simulation::RigConfig;

use crate::control::tuning::{PerformanceTargets, PolePlacement};
use crate::cycle::LoopConfig;

// ─── Control Unit ───────────────────────────────────────────────────

/// Complete validated control-unit configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadedConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub safety: SafetyPolicy,
    #[serde(default)]
    pub actuator: ActuatorConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Simulated rig parameters, binary only.
    #[serde(default)]
    pub simulation: Option<RigConfig>,
}

impl LoadedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.controller.validate()?;
        self.safety.validate()?;
        self.actuator.validate()?;
        if let Some(sim) = &self.simulation {
            sim.validate()?;
        }
        Ok(())
    }

    /// Parameters consumed by [`crate::cycle::ControlLoop`].
    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            controller: self.controller,
            safety: self.safety,
            actuator: self.actuator,
            telemetry: self.telemetry,
        }
    }
}

/// Load and validate the control-unit configuration file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let config = LoadedConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate an in-memory control-unit configuration.
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigError> {
    let config = LoadedConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}

// ─── Tuning ─────────────────────────────────────────────────────────

/// Offline design inputs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuningConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    /// Identified plant; defaults to the reference model.
    #[serde(default = "DiscreteTransferFunction::reference")]
    pub plant: DiscreteTransferFunction,
    pub design: PolePlacement,
    pub targets: PerformanceTargets,
}

impl TuningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.plant.validate()?;
        self.design
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        self.targets
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(())
    }
}

/// Load and validate a tuning file.
pub fn load_tuning_config(path: &Path) -> Result<TuningConfig, ConfigError> {
    let config = TuningConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────
