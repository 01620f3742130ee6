//! Levenberg-Marquardt configuration.
//!
//! [`LMConfig`] collects every policy constant of the solver as a named,
//! documented value. It can be built from presets, from the fluent
//! [`LMConfigBuilder`], or deserialised from TOML:
//!
//! ```toml
//! max_iterations = 10000
//! confidence_multiplier = 1.96
//!
//! [jacobian]
//! relative_step = 1e-6
//! zero_parameter = "reject"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use curvefit_core::types::ConfigError;

/// What the Jacobian estimator does with a parameter that is exactly zero.
///
/// The finite-difference step is relative to the parameter value, so a zero
/// parameter would produce a zero step and a `0 / 0` derivative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroParameterPolicy {
    /// Use this absolute step instead.
    Substitute(f64),
    /// Fail with `SolverError::ZeroParameter`.
    Reject,
}

impl Default for ZeroParameterPolicy {
    fn default() -> Self {
        ZeroParameterPolicy::Substitute(1e-8)
    }
}

/// Finite-difference settings for the Jacobian estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JacobianConfig {
    /// Step as a fraction of the parameter value.
    ///
    /// Default: 1e-5
    pub relative_step: f64,

    /// Handling of parameters that are exactly zero.
    ///
    /// Default: `Substitute(1e-8)`
    pub zero_parameter: ZeroParameterPolicy,
}

impl Default for JacobianConfig {
    fn default() -> Self {
        Self {
            relative_step: 1e-5,
            zero_parameter: ZeroParameterPolicy::default(),
        }
    }
}

/// Configuration for the Levenberg-Marquardt solver.
///
/// # Examples
///
/// ```
/// use curvefit_optimiser::config::LMConfig;
///
/// let config = LMConfig::default();
/// assert_eq!(config.max_iterations, 50_000);
///
/// let config = LMConfig::builder()
///     .max_iterations(200)
///     .confidence_multiplier(1.96)
///     .build();
/// assert_eq!(config.max_iterations, 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LMConfig {
    /// Iteration budget.
    ///
    /// Default: 50 000
    pub max_iterations: usize,

    /// Gradient infinity-norm at or below which the fit has converged.
    ///
    /// Default: 1e-12
    pub gradient_tolerance: f64,

    /// Relative step length at or below which the fit has converged.
    ///
    /// Default: 1e-17
    pub step_tolerance: f64,

    /// Initial damping as a fraction of the largest diagonal of `JᵗJ`.
    ///
    /// Default: 1e-6
    pub tau: f64,

    /// Significant digits kept in the reported parameters; `None` disables
    /// rounding.
    ///
    /// Default: `Some(9)`
    pub significant_digits: Option<u32>,

    /// Standard-deviation multiplier for outlier detection.
    ///
    /// Default: 2.0
    pub confidence_multiplier: f64,

    /// Absolute residual below which no sample is flagged as an outlier.
    ///
    /// Default: 1e-6
    pub outlier_floor: f64,

    /// Finite-difference Jacobian settings.
    pub jacobian: JacobianConfig,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            gradient_tolerance: 1e-12,
            step_tolerance: 1e-17,
            tau: 1e-6,
            significant_digits: Some(9),
            confidence_multiplier: 2.0,
            outlier_floor: 1e-6,
            jacobian: JacobianConfig::default(),
        }
    }
}

impl LMConfig {
    /// Default configuration with a different iteration budget.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Create a configuration builder for fluent construction.
    pub fn builder() -> LMConfigBuilder {
        LMConfigBuilder::new()
    }

    /// Create a fast configuration for interactive use.
    ///
    /// Caps the budget at 500 iterations.
    pub fn fast() -> Self {
        Self::new(500)
    }

    /// Parse a TOML document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed TOML, `Invalid` if [`validate`](Self::validate)
    /// rejects the result.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check every value against its admissible range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be positive".to_string(),
            ));
        }
        non_negative("gradient_tolerance", self.gradient_tolerance)?;
        non_negative("step_tolerance", self.step_tolerance)?;
        positive("tau", self.tau)?;
        if let Some(digits) = self.significant_digits {
            if !(1..=17).contains(&digits) {
                return Err(ConfigError::Invalid(format!(
                    "significant_digits must be between 1 and 17, got {digits}"
                )));
            }
        }
        positive("confidence_multiplier", self.confidence_multiplier)?;
        non_negative("outlier_floor", self.outlier_floor)?;
        positive("jacobian.relative_step", self.jacobian.relative_step)?;
        if let ZeroParameterPolicy::Substitute(step) = self.jacobian.zero_parameter {
            positive("jacobian.zero_parameter.substitute", step)?;
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

/// Builder for [`LMConfig`].
#[derive(Debug, Clone, Default)]
pub struct LMConfigBuilder {
    config: LMConfig,
}

impl LMConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration budget.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the gradient convergence tolerance.
    pub fn gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.config.gradient_tolerance = tolerance;
        self
    }

    /// Set the step-size convergence tolerance.
    pub fn step_tolerance(mut self, tolerance: f64) -> Self {
        self.config.step_tolerance = tolerance;
        self
    }

    /// Set the initial damping scale.
    pub fn tau(mut self, tau: f64) -> Self {
        self.config.tau = tau;
        self
    }

    /// Set (or disable) significant-digit rounding of the parameters.
    pub fn significant_digits(mut self, digits: Option<u32>) -> Self {
        self.config.significant_digits = digits;
        self
    }

    /// Set the outlier confidence multiplier.
    pub fn confidence_multiplier(mut self, multiplier: f64) -> Self {
        self.config.confidence_multiplier = multiplier;
        self
    }

    /// Set the outlier floor.
    pub fn outlier_floor(mut self, floor: f64) -> Self {
        self.config.outlier_floor = floor;
        self
    }

    /// Set the relative finite-difference step.
    pub fn relative_step(mut self, step: f64) -> Self {
        self.config.jacobian.relative_step = step;
        self
    }

    /// Set the zero-parameter policy.
    pub fn zero_parameter(mut self, policy: ZeroParameterPolicy) -> Self {
        self.config.jacobian.zero_parameter = policy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> LMConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // Default Configuration Tests
    // ========================================

    #[test]
    fn test_default_config() {
        let config = LMConfig::default();
        assert_eq!(config.max_iterations, 50_000);
        assert_eq!(config.gradient_tolerance, 1e-12);
        assert_eq!(config.step_tolerance, 1e-17);
        assert_eq!(config.tau, 1e-6);
        assert_eq!(config.significant_digits, Some(9));
        assert_eq!(config.confidence_multiplier, 2.0);
        assert_eq!(config.outlier_floor, 1e-6);
        assert_eq!(config.jacobian.relative_step, 1e-5);
        assert_eq!(
            config.jacobian.zero_parameter,
            ZeroParameterPolicy::Substitute(1e-8)
        );
        assert!(config.validate().is_ok());
    }

    // ========================================
    // Preset Configuration Tests
    // ========================================

    #[test]
    fn test_presets() {
        assert_eq!(LMConfig::fast().max_iterations, 500);
        let config = LMConfig::new(10_000);
        assert_eq!(config.max_iterations, 10_000);
        assert_eq!(config.tau, LMConfig::default().tau);
    }

    #[test]
    fn test_builder() {
        let config = LMConfig::builder()
            .max_iterations(42)
            .significant_digits(None)
            .outlier_floor(1e-10)
            .zero_parameter(ZeroParameterPolicy::Reject)
            .build();
        assert_eq!(config.max_iterations, 42);
        assert_eq!(config.significant_digits, None);
        assert_eq!(config.outlier_floor, 1e-10);
        assert_eq!(config.jacobian.zero_parameter, ZeroParameterPolicy::Reject);
    }

    // ========================================
    // Validation Tests
    // ========================================

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            LMConfig::builder().max_iterations(0).build(),
            LMConfig::builder().tau(0.0).build(),
            LMConfig::builder().gradient_tolerance(-1.0).build(),
            LMConfig::builder().significant_digits(Some(0)).build(),
            LMConfig::builder().relative_step(f64::NAN).build(),
            LMConfig::builder()
                .zero_parameter(ZeroParameterPolicy::Substitute(0.0))
                .build(),
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    // ========================================
    // TOML Loading Tests
    // ========================================

    #[test]
    fn test_from_toml_partial() {
        let config = LMConfig::from_toml_str(
            r#"
            max_iterations = 10000
            confidence_multiplier = 1.96

            [jacobian]
            zero_parameter = "reject"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_iterations, 10_000);
        assert_eq!(config.confidence_multiplier, 1.96);
        assert_eq!(config.jacobian.zero_parameter, ZeroParameterPolicy::Reject);
        assert_eq!(config.jacobian.relative_step, 1e-5);
        assert_eq!(config.tau, 1e-6);
    }

    #[test]
    fn test_from_toml_empty_is_default() {
        assert_eq!(LMConfig::from_toml_str("").unwrap(), LMConfig::default());
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(matches!(
            LMConfig::from_toml_str("max_iterations = \"many\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LMConfig::from_toml_str("max_iterations = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        let err = LMConfig::from_file("/nonexistent/curvefit.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("curvefit.toml"));
    }
}
