//! Regression error types.

use curvefit_core::types::{ConfigError, MatrixError, SolverError};
use thiserror::Error;

/// Linear regression errors.
///
/// # Variants
/// - `Matrix`: A matrix operation failed
/// - `Solver`: The least-squares solve failed
/// - `InsufficientSamples`: No residual degrees of freedom for the variance
/// - `InvalidInput`: Malformed independent or dependent data
/// - `Config`: Configuration could not be loaded or is out of range
#[derive(Debug, Error)]
pub enum RegressionError {
    /// Matrix operation failed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Least-squares solve failed.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Fewer samples than needed to estimate the residual variance.
    #[error("Insufficient samples: {samples} samples for {coefficients} coefficients")]
    InsufficientSamples {
        /// Number of samples supplied
        samples: usize,
        /// Number of coefficients including the intercept
        coefficients: usize,
    },

    /// Malformed input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
