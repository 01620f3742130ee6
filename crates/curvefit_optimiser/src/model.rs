//! Fitted model abstraction.
//!
//! A model maps a parameter vector and one abscissa to a prediction. Any
//! `Fn(&[f64], f64) -> f64` is a model; types with their own state implement
//! [`ResidualModel`] directly.

use curvefit_core::types::SolverError;

/// Scalar model `ŷ = f(params, x)`.
pub trait ResidualModel {
    /// Predicted value at `x`.
    fn evaluate(&self, params: &[f64], x: f64) -> f64;
}

impl<F> ResidualModel for F
where
    F: Fn(&[f64], f64) -> f64,
{
    #[inline]
    fn evaluate(&self, params: &[f64], x: f64) -> f64 {
        self(params, x)
    }
}

/// Residuals `y_i − f(params, x_i)`.
///
/// # Errors
///
/// `NonFiniteModel` at the first sample whose prediction is NaN or infinite.
pub fn residuals<M: ResidualModel + ?Sized>(
    model: &M,
    params: &[f64],
    x_values: &[f64],
    y_values: &[f64],
) -> Result<Vec<f64>, SolverError> {
    x_values
        .iter()
        .zip(y_values)
        .enumerate()
        .map(|(sample, (&x, &y))| {
            let predicted = model.evaluate(params, x);
            if predicted.is_finite() {
                Ok(y - predicted)
            } else {
                Err(SolverError::NonFiniteModel { sample, x })
            }
        })
        .collect()
}
