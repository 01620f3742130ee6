//! Error types for structured error handling.
//!
//! This module provides:
//! - `MatrixError`: Errors from dense matrix construction, indexing and algebra
//! - `SolverError`: Errors from linear and nonlinear least-squares solvers
//! - `ConfigError`: Errors from loading and validating solver configuration

use std::path::PathBuf;

use thiserror::Error;

/// Dense matrix errors.
///
/// Every fallible [`DenseMatrix`](crate::math::matrix::DenseMatrix) operation
/// reports one of these variants instead of panicking or producing NaN.
///
/// # Variants
/// - `InvalidShape`: Requested shape overflows or disagrees with supplied storage
/// - `IndexOutOfRange`: Element, row or column index outside the matrix
/// - `ShapeMismatch`: Operand shapes are incompatible for the operation
/// - `NotSquare`: Operation requires a square matrix
/// - `SingularMatrix`: Inversion hit a numerically zero pivot
/// - `NonFiniteValue`: Matrix contains NaN or infinity where finite values are required
///
/// # Examples
/// ```
/// use curvefit_core::types::MatrixError;
///
/// let err = MatrixError::NotSquare { rows: 2, cols: 3 };
/// assert_eq!(format!("{}", err), "Matrix is not square: 2x3");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatrixError {
    /// Requested shape is not representable or storage length disagrees with it.
    #[error("Invalid shape {rows}x{cols}: {reason}")]
    InvalidShape {
        /// Requested row count
        rows: usize,
        /// Requested column count
        cols: usize,
        /// Why the shape was rejected
        reason: String,
    },

    /// Index outside `[0, rows) x [0, cols)`.
    #[error("Index ({row}, {col}) out of range for {rows}x{cols} matrix")]
    IndexOutOfRange {
        /// Requested row (or `0` for column-only access)
        row: usize,
        /// Requested column (or `0` for row-only access)
        col: usize,
        /// Row count of the matrix
        rows: usize,
        /// Column count of the matrix
        cols: usize,
    },

    /// Operand shapes are incompatible.
    #[error("Shape mismatch in {operation}: {left_rows}x{left_cols} vs {right_rows}x{right_cols}")]
    ShapeMismatch {
        /// Operation that rejected the operands
        operation: String,
        /// Left operand rows
        left_rows: usize,
        /// Left operand columns
        left_cols: usize,
        /// Right operand rows
        right_rows: usize,
        /// Right operand columns
        right_cols: usize,
    },

    /// Operation requires a square matrix.
    #[error("Matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// Pivoting found a numerically zero pivot.
    #[error("Singular matrix: zero pivot in column {column}")]
    SingularMatrix {
        /// Elimination column where the pivot vanished
        column: usize,
    },

    /// NaN or infinity where a finite value is required.
    #[error("Non-finite value {value} at ({row}, {col})")]
    NonFiniteValue {
        /// Row of the offending element
        row: usize,
        /// Column of the offending element
        col: usize,
        /// The offending value
        value: f64,
    },
}

/// Least-squares solver errors.
///
/// Shared by the linear normal-equations solve in this crate and the
/// Levenberg-Marquardt solver built on top of it.
///
/// # Variants
/// - `Matrix`: A matrix operation failed (propagated unchanged)
/// - `UnderdeterminedSystem`: Fewer samples than unknowns
/// - `NonConvergence`: Iteration budget or damping exhausted before convergence
/// - `InvalidInput`: Malformed caller input (empty or mismatched samples)
/// - `NonFiniteModel`: Model evaluation produced NaN or infinity
/// - `NonFiniteJacobian`: Finite-difference derivative produced NaN or infinity
/// - `ZeroParameter`: Zero parameter cannot be perturbed under the reject policy
///
/// # Examples
/// ```
/// use curvefit_core::types::SolverError;
///
/// let err = SolverError::UnderdeterminedSystem { samples: 2, unknowns: 3 };
/// assert!(format!("{}", err).contains("2 samples"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Matrix operation failed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Normal equations are not well-posed.
    #[error("Underdetermined system: {samples} samples for {unknowns} unknowns")]
    UnderdeterminedSystem {
        /// Number of samples supplied
        samples: usize,
        /// Number of unknowns to determine
        unknowns: usize,
    },

    /// Solver did not converge.
    #[error("Failed to converge after {iterations} of {max_iterations} iterations: {reason}")]
    NonConvergence {
        /// Iterations performed
        iterations: usize,
        /// Iteration budget
        max_iterations: usize,
        /// Why the iteration stopped
        reason: String,
        /// Parameters at the last accepted step
        last_params: Vec<f64>,
    },

    /// Invalid caller input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model returned NaN or infinity.
    #[error("Model evaluation is not finite at sample {sample} (x = {x})")]
    NonFiniteModel {
        /// Sample index
        sample: usize,
        /// Sample abscissa
        x: f64,
    },

    /// Finite-difference derivative is NaN or infinity.
    #[error("Jacobian entry is not finite at sample {sample}, parameter {parameter}")]
    NonFiniteJacobian {
        /// Sample index (row)
        sample: usize,
        /// Parameter index (column)
        parameter: usize,
    },

    /// Parameter is exactly zero and the estimator is configured to reject it.
    #[error("Parameter {index} is zero; relative finite-difference step is undefined")]
    ZeroParameter {
        /// Parameter index
        index: usize,
    },
}

impl SolverError {
    /// Whether this error is the recoverable non-convergence outcome.
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, SolverError::NonConvergence { .. })
    }
}

/// Configuration error types.
///
/// Shared by every configuration struct in the workspace.
///
/// # Variants
/// - `Parse`: TOML could not be parsed into a configuration
/// - `Io`: Configuration file could not be read
/// - `Invalid`: A value is outside its admissible range
///
/// # Examples
/// ```
/// use curvefit_core::types::ConfigError;
///
/// let err = ConfigError::Invalid("tau must be positive".to_string());
/// assert_eq!(format!("{}", err), "Invalid configuration: tau must be positive");
/// ```
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML could not be parsed into a configuration.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Io {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A value is outside its admissible range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
