use crate::core::feedback::FeedbackFlags;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_MAX_ITERATIONS: usize = 200;
const DEFAULT_TOLERANCE: f64 = 0.001;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid settings in '{path}': {source}")]
    Invalid { path: String, source: ConfigError },
}

/// Parameters of the iterative superposition.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    /// Number of planar rotations attempted before giving up.
    pub max_iterations: usize,
    /// Largest asymmetry, relative to the diagonal sum, accepted as converged.
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "tolerance",
                reason: "must be a finite, non-negative number",
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FitConfigBuilder {
    max_iterations: Option<usize>,
    tolerance: Option<f64>,
}

impl FitConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Builds the configuration, filling unset parameters with their defaults.
    pub fn build(self) -> Result<FitConfig, ConfigError> {
        let defaults = FitConfig::default();
        let config = FitConfig {
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Library-wide settings, usually read from a TOML file.
///
/// ```toml
/// [fit]
/// max_iterations = 500
/// tolerance = 1e-4
///
/// [feedback]
/// actions = true
/// verbose = false
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub fit: FitConfig,
    pub feedback: FeedbackFlags,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigLoadError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigLoadError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ConfigLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        settings
            .fit
            .validate()
            .map_err(|e| ConfigLoadError::Invalid {
                path: origin.to_string(),
                source: e,
            })?;
        Ok(settings)
    }
}
