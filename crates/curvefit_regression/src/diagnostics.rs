//! Collinearity diagnostics over the independent columns.
//!
//! - [`variance_inflation_factors`]: `VIF_i = 1 / (1 − R²_i)` where `R²_i`
//!   comes from regressing column `i` on all other columns
//! - [`correlation_matrix`]: pairwise simple-regression R²

use curvefit_core::math::linalg::least_squares_fit;
use curvefit_core::math::matrix::DenseMatrix;
use tracing::debug;

use crate::error::RegressionError;

/// `1 − R²` at or below which a column is perfectly explained by the others.
pub const COLLINEARITY_TOLERANCE: f64 = 1e-12;

/// Variance inflation factor of every independent column.
///
/// A single column has nothing to be collinear with and gets `1`. A column
/// that is an exact linear combination of the others gets `+∞`.
///
/// # Errors
///
/// Propagates least-squares failures, e.g. `SingularMatrix` when the *other*
/// columns are themselves collinear.
pub fn variance_inflation_factors(independent: &DenseMatrix) -> Result<Vec<f64>, RegressionError> {
    let mut vifs = Vec::with_capacity(independent.cols());
    for i in 0..independent.cols() {
        let target = DenseMatrix::column_vector(&independent.column(i)?);
        let mut others = independent.clone();
        others.remove_col(i)?;

        let r_squared = least_squares_fit(&others, &target)?.r_squared;
        let unexplained = 1.0 - r_squared;
        let vif = if unexplained <= COLLINEARITY_TOLERANCE {
            f64::INFINITY
        } else {
            1.0 / unexplained
        };
        debug!(column = i, r_squared, vif, "variance inflation factor");
        vifs.push(vif);
    }
    Ok(vifs)
}

/// Symmetric `k × k` matrix of pairwise R² between independent columns.
///
/// The diagonal is `1`.
///
/// # Errors
///
/// `SingularMatrix` if a column is constant.
pub fn correlation_matrix(independent: &DenseMatrix) -> Result<DenseMatrix, RegressionError> {
    let k = independent.cols();
    let mut correlation = DenseMatrix::new(k, k)?;
    for i in 0..k {
        correlation.set(i, i, 1.0)?;
        let dependent = DenseMatrix::column_vector(&independent.column(i)?);
        for j in i + 1..k {
            let regressor = DenseMatrix::column_vector(&independent.column(j)?);
            let r_squared = least_squares_fit(&regressor, &dependent)?.r_squared;
            correlation.set(i, j, r_squared)?;
            correlation.set(j, i, r_squared)?;
        }
    }
    Ok(correlation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use curvefit_core::types::{MatrixError, SolverError};

    fn factorial_design() -> DenseMatrix {
        DenseMatrix::from_rows(&[
            vec![-1.0, -1.0],
            vec![1.0, -1.0],
            vec![-1.0, 1.0],
            vec![1.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_orthogonal_columns_have_unit_vif() {
        let vifs = variance_inflation_factors(&factorial_design()).unwrap();
        assert_eq!(vifs.len(), 2);
        for vif in vifs {
            assert_abs_diff_eq!(vif, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_single_column_vif() {
        let x = DenseMatrix::column_vector(&[1.0, 2.0, 4.0]);
        assert_eq!(variance_inflation_factors(&x).unwrap().len(), 1);
        assert_abs_diff_eq!(variance_inflation_factors(&x).unwrap()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_perfect_collinearity_is_infinite() {
        let x = DenseMatrix::from_rows(&[
            vec![1.0, 2.0],
            vec![2.0, 4.0],
            vec![3.0, 6.0],
            vec![4.0, 8.0],
        ])
        .unwrap();
        let vifs = variance_inflation_factors(&x).unwrap();
        assert!(vifs.iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn test_partial_collinearity_inflates() {
        let x = DenseMatrix::from_rows(&[
            vec![1.0, 1.1],
            vec![2.0, 1.9],
            vec![3.0, 3.2],
            vec![4.0, 3.9],
            vec![5.0, 5.1],
        ])
        .unwrap();
        let vifs = variance_inflation_factors(&x).unwrap();
        assert!(vifs[0] > 10.0);
        assert_abs_diff_eq!(vifs[0], vifs[1], epsilon = 1e-6);
    }

    #[test]
    fn test_correlation_matrix() {
        let x = DenseMatrix::from_rows(&[
            vec![-1.0, -1.0, -2.0],
            vec![1.0, -1.0, 2.0],
            vec![-1.0, 1.0, -2.0],
            vec![1.0, 1.0, 2.0],
        ])
        .unwrap();
        let c = correlation_matrix(&x).unwrap();

        assert_eq!(c.shape(), (3, 3));
        for i in 0..3 {
            assert_eq!(c.get(i, i).unwrap(), 1.0);
            for j in 0..3 {
                assert_eq!(c.get(i, j).unwrap(), c.get(j, i).unwrap());
            }
        }
        assert_abs_diff_eq!(c.get(0, 1).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.get(0, 2).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_correlation_with_constant_column() {
        let x = DenseMatrix::from_rows(&[vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]]).unwrap();
        assert!(matches!(
            correlation_matrix(&x),
            Err(RegressionError::Solver(SolverError::Matrix(
                MatrixError::SingularMatrix { .. }
            )))
        ));
    }
}
