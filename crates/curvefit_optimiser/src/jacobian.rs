//! Central-difference Jacobian estimation.
//!
//! For parameter `j` the step is `delta = params[j] * relative_step` and
//!
//! ```text
//! J[i, j] = (f(p − delta·e_j, x_i) − f(p + delta·e_j, x_i)) / (2·delta)
//! ```
//!
//! which is `−∂f/∂p_j`, i.e. the derivative of the residual `y − f`. The
//! solver's step `h = −(JᵗJ + μI)⁻¹ Jᵗr` relies on this sign.

use curvefit_core::math::matrix::DenseMatrix;
use curvefit_core::types::SolverError;

use crate::config::{JacobianConfig, ZeroParameterPolicy};
use crate::model::ResidualModel;

/// Finite-difference Jacobian of a [`ResidualModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JacobianEstimator {
    config: JacobianConfig,
}

impl JacobianEstimator {
    /// Create an estimator with the given step settings.
    pub fn new(config: JacobianConfig) -> Self {
        Self { config }
    }

    /// Get the estimator configuration.
    pub fn config(&self) -> &JacobianConfig {
        &self.config
    }

    /// Estimate the `n × p` residual Jacobian at `params`.
    ///
    /// # Errors
    ///
    /// - `ZeroParameter` if a parameter is zero under
    ///   [`ZeroParameterPolicy::Reject`]
    /// - `NonFiniteJacobian` for any NaN or infinite entry
    /// - `Matrix(InvalidShape)` if `n × p` overflows
    pub fn estimate<M: ResidualModel + ?Sized>(
        &self,
        model: &M,
        params: &[f64],
        x_values: &[f64],
    ) -> Result<DenseMatrix, SolverError> {
        let n = x_values.len();
        let p = params.len();
        let mut jacobian = DenseMatrix::new(n, p)?;
        let mut perturbed = params.to_vec();

        for (j, &value) in params.iter().enumerate() {
            let delta = self.step(j, value)?;

            for (i, &x) in x_values.iter().enumerate() {
                perturbed[j] = value - delta;
                let lower = model.evaluate(&perturbed, x);
                perturbed[j] = value + delta;
                let upper = model.evaluate(&perturbed, x);

                let derivative = (lower - upper) / (2.0 * delta);
                if !derivative.is_finite() {
                    return Err(SolverError::NonFiniteJacobian {
                        sample: i,
                        parameter: j,
                    });
                }
                jacobian.set(i, j, derivative)?;
            }
            perturbed[j] = value;
        }

        Ok(jacobian)
    }

    fn step(&self, index: usize, value: f64) -> Result<f64, SolverError> {
        let delta = value * self.config.relative_step;
        if delta != 0.0 {
            return Ok(delta);
        }
        match self.config.zero_parameter {
            ZeroParameterPolicy::Substitute(step) => Ok(step),
            ZeroParameterPolicy::Reject => Err(SolverError::ZeroParameter { index }),
        }
    }
}
