//! Linear regression configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use curvefit_core::types::ConfigError;

/// Outlier policy for [`LinearRegression`](crate::linear::LinearRegression).
///
/// Common multipliers: 1.645 (90%), 1.96 (95%), 2.576 (99%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Standard-deviation multiplier for outlier detection.
    ///
    /// Default: 1.96
    pub confidence_multiplier: f64,

    /// Absolute residual below which no sample is flagged.
    ///
    /// Default: 1e-10
    pub outlier_floor: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            confidence_multiplier: 1.96,
            outlier_floor: 1e-10,
        }
    }
}

impl RegressionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence multiplier.
    pub fn with_confidence_multiplier(mut self, multiplier: f64) -> Self {
        self.confidence_multiplier = multiplier;
        self
    }

    /// Set the outlier floor.
    pub fn with_outlier_floor(mut self, floor: f64) -> Self {
        self.outlier_floor = floor;
        self
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check both values against their admissible ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.confidence_multiplier.is_finite() && self.confidence_multiplier > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "confidence_multiplier must be positive and finite, got {}",
                self.confidence_multiplier
            )));
        }
        if !(self.outlier_floor.is_finite() && self.outlier_floor >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "outlier_floor must be non-negative and finite, got {}",
                self.outlier_floor
            )));
        }
        Ok(())
    }
}
