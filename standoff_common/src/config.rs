//! TOML settings: error type, log level, the `[shared]` section and the
//! generic file loader.
//!
//! Loading is two-phase. [`ConfigLoader`] turns a file into a typed value
//! (I/O and syntax errors); each section's `validate()` then checks ranges
//! and cross-field constraints.
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use standoff_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct BenchSettings {
//!     shared: SharedConfig,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let settings = BenchSettings::load(Path::new("config/standoff.toml"))?;
//!     settings.shared.validate()?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

/// Why a settings file could not be turned into a usable configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("Config file {0} does not exist")]
    FileNotFound(String),

    /// Unreadable file or malformed TOML / wrong field types.
    #[error("Config parse error: {0}")]
    ParseError(String),

    /// Well-formed but out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Verbosity of the `tracing` subscriber installed by the binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-step controller samples.
    Trace,
    /// Telemetry samples and collaborator hiccups.
    Debug,
    /// Session start / stop / re-arm.
    #[default]
    Info,
    /// Safety stops.
    Warn,
    /// Actuator failures.
    Error,
}

impl LogLevel {
    /// Directive string for `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// `[shared]` section read by both binaries.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "standoff-rig-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Tags every diagnostic line of the process.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: String::from("standoff"),
        }
    }
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name must not be blank".into(),
            ));
        }
        Ok(())
    }
}

/// Read a TOML document into any deserializable settings type.
///
/// Implemented for every `DeserializeOwned` type. Only I/O and syntax are
/// checked here; `FileNotFound` is kept apart from other read failures so
/// binaries can print a precise hint.
pub trait ConfigLoader: Sized + DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ConfigError::FileNotFound(path.display().to_string()))
            }
            Err(e) => Err(ConfigError::ParseError(format!(
                "reading {}: {e}",
                path.display()
            ))),
        }
    }

    fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: DeserializeOwned> ConfigLoader for T {}
