//! Multiple linear regression with an intercept.
//!
//! [`LinearRegression::fit`] solves the normal equations through
//! `curvefit_core`, then derives residual statistics, outliers and
//! collinearity diagnostics in one pass.
//!
//! # Example
//!
//! ```
//! use curvefit_core::math::matrix::DenseMatrix;
//! use curvefit_regression::linear::LinearRegression;
//!
//! let x = DenseMatrix::column_vector(&[0.0, 1.0, 2.0, 3.0, 4.0]);
//! let y = DenseMatrix::column_vector(&[1.0, 3.0, 5.0, 7.0, 9.0]);
//!
//! let fit = LinearRegression::with_defaults().fit(&x, &y).unwrap();
//! assert!((fit.intercept - 1.0).abs() < 1e-9);
//! assert!((fit.slope - 2.0).abs() < 1e-9);
//! ```

use curvefit_core::math::linalg::least_squares_fit;
use curvefit_core::math::matrix::DenseMatrix;
use curvefit_core::math::statistics::{detect_outliers, Outlier, OutlierRule};
use curvefit_core::types::MatrixError;
use tracing::{info, warn};

use crate::config::RegressionConfig;
use crate::diagnostics::{correlation_matrix, variance_inflation_factors};
use crate::error::RegressionError;

/// VIF above which collinearity is logged as a warning.
const HIGH_VIF: f64 = 10.0;

/// Ordinary least-squares regressor.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    config: RegressionConfig,
}

/// A fitted linear regression.
///
/// Per-sample pairs use the first independent column as the abscissa.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearFit {
    /// Intercept first, then one coefficient per independent column.
    pub coefficients: Vec<f64>,
    /// `coefficients[0]`.
    pub intercept: f64,
    /// `coefficients[1]`.
    pub slope: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// R² penalised for the number of coefficients.
    pub adjusted_r_squared: f64,
    /// `SSE / (n − q)`.
    pub variance: f64,
    /// Minimum of each independent column.
    pub x_min: Vec<f64>,
    /// Maximum of each independent column.
    pub x_max: Vec<f64>,
    /// Minimum dependent value.
    pub y_min: f64,
    /// Maximum dependent value.
    pub y_max: f64,
    /// `(x₀, y − ŷ)` per sample.
    pub residuals: Vec<(f64, f64)>,
    /// `(x₀, ŷ)` per sample.
    pub predictions: Vec<(f64, f64)>,
    /// `(y, ŷ)` per sample.
    pub xy_predictions: Vec<(f64, f64)>,
    /// Samples whose residual breaks the outlier rule.
    pub outliers: Vec<Outlier>,
    /// Variance inflation factor per independent column.
    pub vifs: Vec<f64>,
    /// Pairwise R² between independent columns.
    pub correlation: DenseMatrix,
    independent: DenseMatrix,
    dependent: Vec<f64>,
}

impl LinearFit {
    /// Square root of [`variance`](Self::variance).
    pub fn standard_deviation(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Number of independent columns.
    pub fn independent_count(&self) -> usize {
        self.independent.cols()
    }

    /// Dependent values with every independent except `index` held at its
    /// value in the sample with the smallest dependent value.
    ///
    /// Returns `(x_index, corrected_y)` per sample, which isolates the effect
    /// of independent `index` for plotting.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if `index` is not an independent column.
    pub fn corrected_dependents(&self, index: usize) -> Result<Vec<(f64, f64)>, RegressionError> {
        let k = self.independent.cols();
        if index >= k {
            return Err(MatrixError::IndexOutOfRange {
                row: 0,
                col: index,
                rows: self.independent.rows(),
                cols: k,
            }
            .into());
        }
        let reference = DenseMatrix::column_vector(&self.dependent)
            .argmin()
            .ok_or_else(|| RegressionError::InvalidInput("no samples".to_string()))?;
        let reference_row = self.independent.row(reference)?;

        let mut corrected = Vec::with_capacity(self.dependent.len());
        for (i, &y) in self.dependent.iter().enumerate() {
            let row = self.independent.row(i)?;
            let delta: f64 = (0..k)
                .filter(|&j| j != index)
                .map(|j| self.coefficients[j + 1] * (row[j] - reference_row[j]))
                .sum();
            corrected.push((row[index], y - delta));
        }
        Ok(corrected)
    }
}

impl LinearRegression {
    /// Create a regressor with the given configuration.
    pub fn new(config: RegressionConfig) -> Self {
        Self { config }
    }

    /// Create a regressor with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Get the regressor configuration.
    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Regress `dependent` (one column) on `independent` (one column per
    /// variable) with an intercept.
    ///
    /// # Errors
    ///
    /// - `Config` if the configuration is out of range
    /// - `InvalidInput` without independent columns or with a multi-column
    ///   dependent
    /// - `InsufficientSamples` unless there are more samples than coefficients
    /// - `Solver` / `Matrix` from the least-squares solve and diagnostics
    pub fn fit(
        &self,
        independent: &DenseMatrix,
        dependent: &DenseMatrix,
    ) -> Result<LinearFit, RegressionError> {
        self.config.validate()?;
        let k = independent.cols();
        if k == 0 {
            return Err(RegressionError::InvalidInput(
                "at least one independent column is required".to_string(),
            ));
        }
        if dependent.cols() != 1 {
            return Err(RegressionError::InvalidInput(format!(
                "dependent must be a single column, got {} columns",
                dependent.cols()
            )));
        }
        let n = dependent.rows();
        let q = k + 1;
        if n <= q {
            return Err(RegressionError::InsufficientSamples {
                samples: n,
                coefficients: q,
            });
        }

        let solution = least_squares_fit(independent, dependent)?;
        let coefficients = solution.coefficients.clone();
        let variance = solution.sse / (n - q) as f64;
        let adjusted_r_squared = solution
            .adjusted_r_squared
            .unwrap_or(solution.r_squared);

        let x0 = independent.column(0)?;
        let y = dependent.as_slice();
        let mut residuals = Vec::with_capacity(n);
        let mut predictions = Vec::with_capacity(n);
        let mut xy_predictions = Vec::with_capacity(n);
        let mut raw_residuals = Vec::with_capacity(n);
        for i in 0..n {
            let predicted = solution.predict(&independent.row(i)?);
            let residual = y[i] - predicted;
            residuals.push((x0[i], residual));
            predictions.push((x0[i], predicted));
            xy_predictions.push((y[i], predicted));
            raw_residuals.push(residual);
        }

        let rule = OutlierRule::new(self.config.confidence_multiplier, self.config.outlier_floor);
        let outliers = detect_outliers(&x0, y, &raw_residuals, variance.sqrt(), &rule);
        if !outliers.is_empty() {
            warn!(count = outliers.len(), "outliers detected");
        }

        let vifs = variance_inflation_factors(independent)?;
        if let Some(max_vif) = vifs.iter().copied().reduce(f64::max) {
            if max_vif > HIGH_VIF {
                warn!(max_vif, "independent variables are strongly collinear");
            }
        }
        let correlation = correlation_matrix(independent)?;

        let mut x_min = Vec::with_capacity(k);
        let mut x_max = Vec::with_capacity(k);
        for j in 0..k {
            x_min.push(independent.column_min(j)?);
            x_max.push(independent.column_max(j)?);
        }

        info!(
            samples = n,
            coefficients = q,
            r_squared = solution.r_squared,
            "linear regression fitted"
        );

        Ok(LinearFit {
            intercept: coefficients[0],
            slope: coefficients[1],
            coefficients,
            r_squared: solution.r_squared,
            adjusted_r_squared,
            variance,
            x_min,
            x_max,
            y_min: dependent.min_value().unwrap_or(f64::NAN),
            y_max: dependent.max_value().unwrap_or(f64::NAN),
            residuals,
            predictions,
            xy_predictions,
            outliers,
            vifs,
            correlation,
            independent: independent.clone(),
            dependent: y.to_vec(),
        })
    }
}
