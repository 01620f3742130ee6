//! Linear solves built on [`DenseMatrix`] inversion.
//!
//! - [`solve`]: `A x = b` via `A⁻¹ b`
//! - [`least_squares_fit`]: ordinary least squares with an intercept, solved
//!   through the normal equations `XᵗX β = Xᵗy`
//!
//! # Example
//!
//! ```
//! use curvefit_core::math::linalg::least_squares_fit;
//! use curvefit_core::math::matrix::DenseMatrix;
//!
//! // y = 2x + 3
//! let x = DenseMatrix::column_vector(&[0.0, 1.0, 2.0, 3.0]);
//! let y = DenseMatrix::column_vector(&[3.0, 5.0, 7.0, 9.0]);
//!
//! let fit = least_squares_fit(&x, &y).unwrap();
//! assert!((fit.intercept() - 3.0).abs() < 1e-9);
//! assert!((fit.coefficients[1] - 2.0).abs() < 1e-9);
//! assert!((fit.r_squared - 1.0).abs() < 1e-9);
//! ```

use super::matrix::DenseMatrix;
use super::statistics::{coefficient_of_determination, sum_of_squares, total_sum_of_squares};
use crate::types::{MatrixError, SolverError};

/// Solve `A x = b` by inverting `A`.
///
/// # Errors
///
/// - `NotSquare` / `SingularMatrix` / `NonFiniteValue` from inversion
/// - `ShapeMismatch` if `b` does not have `A.rows()` rows
pub fn solve(a: &DenseMatrix, b: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
    a.invert()?.multiply(b)
}

/// Result of an ordinary least-squares fit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearSolution {
    /// Intercept first, then one coefficient per independent column.
    pub coefficients: Vec<f64>,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// R² penalised for the number of coefficients; `None` without residual
    /// degrees of freedom.
    pub adjusted_r_squared: Option<f64>,
    /// Sum of squared residuals.
    pub sse: f64,
}

impl LinearSolution {
    /// The intercept term.
    pub fn intercept(&self) -> f64 {
        self.coefficients[0]
    }

    /// Prediction for one row of independent values.
    ///
    /// # Panics
    ///
    /// Panics if `row.len() + 1 != coefficients.len()`.
    pub fn predict(&self, row: &[f64]) -> f64 {
        assert_eq!(
            row.len() + 1,
            self.coefficients.len(),
            "row length must match the number of independent variables"
        );
        self.coefficients[0]
            + self.coefficients[1..]
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Ordinary least squares of `dependent` on `independent` with an intercept.
///
/// `independent` holds one column per explanatory variable (zero columns fits
/// the mean); `dependent` is a single column with the same number of rows.
///
/// # Errors
///
/// - `InvalidInput` if there are no samples or `dependent` is not one column
/// - `Matrix(ShapeMismatch)` if the row counts differ
/// - `UnderdeterminedSystem` if there are fewer samples than coefficients
/// - `Matrix(SingularMatrix)` for collinear independent columns
pub fn least_squares_fit(
    independent: &DenseMatrix,
    dependent: &DenseMatrix,
) -> Result<LinearSolution, SolverError> {
    if dependent.cols() != 1 {
        return Err(SolverError::InvalidInput(format!(
            "dependent must be a single column, got {} columns",
            dependent.cols()
        )));
    }
    if independent.rows() != dependent.rows() {
        return Err(MatrixError::ShapeMismatch {
            operation: "least_squares_fit".to_string(),
            left_rows: independent.rows(),
            left_cols: independent.cols(),
            right_rows: dependent.rows(),
            right_cols: dependent.cols(),
        }
        .into());
    }
    let n = dependent.rows();
    if n == 0 {
        return Err(SolverError::InvalidInput("no samples".to_string()));
    }
    let q = independent.cols() + 1;
    if n < q {
        return Err(SolverError::UnderdeterminedSystem {
            samples: n,
            unknowns: q,
        });
    }

    let design = design_matrix(independent)?;
    let design_t = design.transpose();
    let normal = design_t.multiply(&design)?;
    let rhs = design_t.multiply(dependent)?;
    let beta = solve(&normal, &rhs)?;

    let fitted = design.multiply(&beta)?;
    let residuals = dependent.subtract(&fitted)?;
    let sse = sum_of_squares(residuals.as_slice());
    let sst = total_sum_of_squares(dependent.as_slice());
    let r_squared = coefficient_of_determination(sse, sst);

    let adjusted_r_squared = if n > q {
        Some(1.0 - (1.0 - r_squared) * (n - 1) as f64 / (n - q) as f64)
    } else {
        None
    };

    Ok(LinearSolution {
        coefficients: beta.into_vec(),
        r_squared,
        adjusted_r_squared,
        sse,
    })
}

/// `[1 | independent]`.
fn design_matrix(independent: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
    let (n, k) = independent.shape();
    let src = independent.as_slice();
    let mut values = Vec::with_capacity(n * (k + 1));
    for r in 0..n {
        values.push(1.0);
        values.extend_from_slice(&src[r * k..(r + 1) * k]);
    }
    DenseMatrix::from_vec(n, k + 1, values)
}
