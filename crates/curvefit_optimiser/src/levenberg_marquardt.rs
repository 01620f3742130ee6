//! Levenberg-Marquardt nonlinear least-squares solver.
//!
//! This module provides the [`LevenbergMarquardtSolver`] for fitting a scalar
//! model `ŷ = f(p, x)` to samples `(x_i, y_i)`.
//!
//! # Algorithm
//!
//! With residuals `r = y − f(p, x)`, residual Jacobian `J`, `A = JᵗJ` and
//! `g = Jᵗr`, each iteration solves
//!
//! ```text
//! (A + μI) h = −g
//! ```
//!
//! and evaluates the gain ratio
//!
//! ```text
//! ρ = (‖r‖²/2 − ‖r'‖²/2) / (hᵗ(μh − g) / 2)
//! ```
//!
//! A step with `ρ > 0` is accepted and the damping shrinks by
//! `max(1/3, 1 − (2ρ − 1)³)`; otherwise `μ` grows geometrically. The fit has
//! converged when `‖g‖∞` or the relative step length falls below tolerance.
//!
//! # Example
//!
//! ```
//! use curvefit_optimiser::{LMConfig, LevenbergMarquardtSolver};
//!
//! let xs: [f64; 5] = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let ys: Vec<f64> = xs.iter().map(|&x| 2.0 * (0.5 * x).exp()).collect();
//!
//! let solver = LevenbergMarquardtSolver::new(LMConfig::default());
//! let model = |p: &[f64], x: f64| p[0] * (p[1] * x).exp();
//! let fit = solver.solve(&model, &[1.0, 0.1], &xs, &ys).unwrap();
//!
//! assert!(fit.converged);
//! assert!((fit.params[0] - 2.0).abs() < 1e-6);
//! assert!((fit.params[1] - 0.5).abs() < 1e-6);
//! ```

use curvefit_core::math::matrix::DenseMatrix;
use curvefit_core::math::rounding::RoundToSignificant;
use curvefit_core::math::statistics::{
    coefficient_of_determination, detect_outliers, sum_of_squares, total_sum_of_squares,
    Outlier, OutlierRule,
};
use curvefit_core::types::SolverError;
use tracing::{debug, info, trace, warn};

use crate::config::LMConfig;
use crate::jacobian::JacobianEstimator;
use crate::model::{residuals, ResidualModel};

/// Test that ended the iteration successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// `‖Jᵗr‖∞` fell to the gradient tolerance.
    GradientNorm,
    /// The step became negligible relative to the parameters.
    StepSize,
}

/// Outcome of a converged Levenberg-Marquardt fit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LMFit {
    /// Fitted parameters, rounded to the configured significant digits.
    pub params: Vec<f64>,
    /// Whether a convergence test ended the iteration.
    pub converged: bool,
    /// Which convergence test fired.
    pub termination: Termination,
    /// Iterations performed.
    pub iterations: usize,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// `SSE / (n + p)`.
    pub variance: f64,
    /// Samples whose residual breaks the outlier rule.
    pub outliers: Vec<Outlier>,
    /// `(x_i, y_i − ŷ_i)` per sample.
    pub residuals: Vec<(f64, f64)>,
    /// Damping at termination.
    pub final_mu: f64,
}

impl LMFit {
    /// Square root of [`variance`](Self::variance).
    pub fn standard_deviation(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Sum of squared residuals.
    pub fn sse(&self) -> f64 {
        self.residuals.iter().map(|(_, r)| r * r).sum()
    }
}

/// Levenberg-Marquardt nonlinear least-squares solver.
///
/// The solver is stateless between calls; each [`solve`](Self::solve) owns
/// its working matrices, so one solver can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardtSolver {
    config: LMConfig,
}

/// Quantities evaluated at an accepted parameter vector.
struct State {
    residuals: Vec<f64>,
    /// `JᵗJ`
    normal: DenseMatrix,
    /// `Jᵗr` as a column
    gradient: DenseMatrix,
    /// `‖r‖² / 2`
    cost: f64,
    jacobian_is_zero: bool,
}

impl State {
    fn evaluate<M: ResidualModel + ?Sized>(
        model: &M,
        estimator: &JacobianEstimator,
        params: &[f64],
        x_values: &[f64],
        residuals: Vec<f64>,
    ) -> Result<Self, SolverError> {
        let jacobian = estimator.estimate(model, params, x_values)?;
        let jacobian_t = jacobian.transpose();
        let r = DenseMatrix::column_vector(&residuals);
        let normal = jacobian_t.multiply(&jacobian)?;
        let gradient = jacobian_t.multiply(&r)?;
        trace!(%normal, %gradient, "normal equations");

        Ok(Self {
            cost: sum_of_squares(&residuals) / 2.0,
            jacobian_is_zero: jacobian.infinity_norm() == 0.0,
            residuals,
            normal,
            gradient,
        })
    }
}

impl LevenbergMarquardtSolver {
    /// Create a new LM solver with the given configuration.
    pub fn new(config: LMConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Fit `model` to `(x_values, y_values)` starting from `initial_params`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an invalid configuration, no parameters, no
    ///   samples or unequal sample lengths
    /// - `UnderdeterminedSystem` if there are fewer samples than parameters
    /// - `NonFiniteModel` if the model is not finite at the initial guess
    /// - `NonFiniteJacobian` / `ZeroParameter` from Jacobian estimation
    /// - `Matrix(SingularMatrix)` if the damped normal matrix cannot be inverted
    /// - `NonConvergence` if the iteration budget or the damping is exhausted,
    ///   or the model does not respond to any parameter
    pub fn solve<M: ResidualModel + ?Sized>(
        &self,
        model: &M,
        initial_params: &[f64],
        x_values: &[f64],
        y_values: &[f64],
    ) -> Result<LMFit, SolverError> {
        self.validate_input(initial_params, x_values, y_values)?;
        let config = &self.config;
        let estimator = JacobianEstimator::new(config.jacobian);
        let n_params = initial_params.len();

        let mut params = initial_params.to_vec();
        let initial_residuals = residuals(model, &params, x_values, y_values)?;
        let mut state = State::evaluate(model, &estimator, &params, x_values, initial_residuals)?;

        if state.jacobian_is_zero && state.cost > 0.0 {
            warn!("model does not respond to any parameter");
            return Err(SolverError::NonConvergence {
                iterations: 0,
                max_iterations: config.max_iterations,
                reason: "Jacobian is identically zero with a nonzero residual".to_string(),
                last_params: params,
            });
        }

        let mut mu = config.tau * max_diagonal(&state.normal);
        let mut v = 2.0;
        let mut k = 0;
        let identity = DenseMatrix::identity(n_params);

        let mut termination = if state.gradient.infinity_norm() <= config.gradient_tolerance {
            Some(Termination::GradientNorm)
        } else {
            None
        };

        while termination.is_none() && k < config.max_iterations {
            k += 1;

            let damped = state.normal.add(&identity.scale(mu))?;
            let step = damped.invert()?.multiply(&state.gradient.scale(-1.0))?;

            let params_norm = DenseMatrix::column_vector(&params).l2_norm();
            if step.l2_norm() <= config.step_tolerance * (params_norm + config.step_tolerance) {
                termination = Some(Termination::StepSize);
                break;
            }

            let trial: Vec<f64> = params
                .iter()
                .zip(step.as_slice())
                .map(|(p, h)| p + h)
                .collect();

            let trial_residuals = match residuals(model, &trial, x_values, y_values) {
                Ok(r) => Some(r),
                Err(SolverError::NonFiniteModel { sample, x }) => {
                    debug!(k, sample, x, "trial step left the model domain");
                    None
                }
                Err(e) => return Err(e),
            };

            let rho = match &trial_residuals {
                Some(r) => {
                    let predicted = step.dot(&step.scale(mu).subtract(&state.gradient)?)? / 2.0;
                    (state.cost - sum_of_squares(r) / 2.0) / predicted
                }
                None => f64::NEG_INFINITY,
            };

            match trial_residuals {
                Some(r) if rho > 0.0 => {
                    params = trial;
                    state = State::evaluate(model, &estimator, &params, x_values, r)?;
                    if state.gradient.infinity_norm() <= config.gradient_tolerance {
                        termination = Some(Termination::GradientNorm);
                    }
                    mu *= (1.0 / 3.0_f64).max(1.0 - (2.0 * rho - 1.0).powi(3));
                    v = 2.0;
                    debug!(k, mu, rho, cost = state.cost, "step accepted");
                }
                _ => {
                    mu *= v;
                    v *= 2.0;
                    debug!(k, mu, rho, "step rejected");
                    if !mu.is_finite() {
                        warn!(k, "damping factor overflowed");
                        return Err(SolverError::NonConvergence {
                            iterations: k,
                            max_iterations: config.max_iterations,
                            reason: "damping factor overflowed".to_string(),
                            last_params: params,
                        });
                    }
                }
            }
        }

        let Some(termination) = termination else {
            warn!(
                iterations = k,
                max_iterations = config.max_iterations,
                "iteration budget exhausted"
            );
            return Err(SolverError::NonConvergence {
                iterations: k,
                max_iterations: config.max_iterations,
                reason: "iteration budget exhausted".to_string(),
                last_params: params,
            });
        };

        Ok(self.finalize(params, state, termination, k, mu, x_values, y_values))
    }

    #[allow(clippy::too_many_arguments)]
    fn finalize(
        &self,
        params: Vec<f64>,
        state: State,
        termination: Termination,
        iterations: usize,
        mu: f64,
        x_values: &[f64],
        y_values: &[f64],
    ) -> LMFit {
        let config = &self.config;
        let sse = sum_of_squares(&state.residuals);
        let r_squared = coefficient_of_determination(sse, total_sum_of_squares(y_values));
        let variance = sse / (x_values.len() + params.len()) as f64;
        let standard_deviation = variance.sqrt();

        let params = match config.significant_digits {
            Some(digits) => params
                .into_iter()
                .map(|p| p.round_to_significant(digits))
                .collect(),
            None => params,
        };

        let outliers = if r_squared > 0.0 {
            let rule = OutlierRule::new(config.confidence_multiplier, config.outlier_floor);
            detect_outliers(
                x_values,
                y_values,
                &state.residuals,
                standard_deviation,
                &rule,
            )
        } else {
            Vec::new()
        };
        if !outliers.is_empty() {
            warn!(count = outliers.len(), "outliers detected");
        }

        info!(
            ?termination,
            iterations,
            r_squared,
            "Levenberg-Marquardt converged"
        );

        LMFit {
            params,
            converged: true,
            termination,
            iterations,
            r_squared,
            variance,
            outliers,
            residuals: x_values.iter().copied().zip(state.residuals).collect(),
            final_mu: mu,
        }
    }

    fn validate_input(
        &self,
        initial_params: &[f64],
        x_values: &[f64],
        y_values: &[f64],
    ) -> Result<(), SolverError> {
        self.config
            .validate()
            .map_err(|e| SolverError::InvalidInput(e.to_string()))?;
        if initial_params.is_empty() {
            return Err(SolverError::InvalidInput("empty parameter vector".to_string()));
        }
        if x_values.len() != y_values.len() {
            return Err(SolverError::InvalidInput(format!(
                "x_values has {} samples but y_values has {}",
                x_values.len(),
                y_values.len()
            )));
        }
        if x_values.is_empty() {
            return Err(SolverError::InvalidInput("no samples".to_string()));
        }
        if x_values.len() < initial_params.len() {
            return Err(SolverError::UnderdeterminedSystem {
                samples: x_values.len(),
                unknowns: initial_params.len(),
            });
        }
        Ok(())
    }
}

/// Largest diagonal entry of a square matrix (`0` if empty).
fn max_diagonal(m: &DenseMatrix) -> f64 {
    m.diagonal()
        .and_then(|d| d.max_value())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZeroParameterPolicy;
    use approx::assert_abs_diff_eq;
    use curvefit_core::types::MatrixError;

    fn exponential(p: &[f64], x: f64) -> f64 {
        p[0] * (p[1] * x).exp()
    }

    fn exponential_data() -> (Vec<f64>, Vec<f64>) {
        let xs = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = xs.iter().map(|&x| exponential(&[2.0, 0.5], x)).collect();
        (xs, ys)
    }

    // ========================================
    // Convergence Tests
    // ========================================

    #[test]
    fn test_exponential_recovery() {
        let (xs, ys) = exponential_data();
        let solver = LevenbergMarquardtSolver::with_defaults();
        let fit = solver.solve(&exponential, &[1.0, 0.1], &xs, &ys).unwrap();

        assert!(fit.converged);
        assert_abs_diff_eq!(fit.params[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.params[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-9);
        assert!(fit.variance < 1e-12);
        assert!(fit.outliers.is_empty());
        assert_eq!(fit.residuals.len(), 5);
        assert!(fit.iterations > 0);
        assert!(fit.final_mu > 0.0);
    }

    #[test]
    fn test_linear_model() {
        let xs: Vec<f64> = (0..6).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 1.0 + 2.0 * x).collect();
        let line = |p: &[f64], x: f64| p[0] + p[1] * x;
        let fit = LevenbergMarquardtSolver::with_defaults()
            .solve(&line, &[0.5, 0.5], &xs, &ys)
            .unwrap();
        assert_abs_diff_eq!(fit.params[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.params[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_already_optimal_terminates_immediately() {
        let (xs, ys) = exponential_data();
        let fit = LevenbergMarquardtSolver::with_defaults()
            .solve(&exponential, &[2.0, 0.5], &xs, &ys)
            .unwrap();
        assert_eq!(fit.termination, Termination::GradientNorm);
        assert_eq!(fit.iterations, 0);
    }

    #[test]
    fn test_rounding_can_be_disabled() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [1.0 / 3.0; 3];
        let constant = |p: &[f64], _x: f64| p[0];
        let config = LMConfig::builder().significant_digits(None).build();
        let fit = LevenbergMarquardtSolver::new(config)
            .solve(&constant, &[1.0], &xs, &ys)
            .unwrap();
        assert_abs_diff_eq!(fit.params[0], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_decoupled_parameters_of_very_different_scale() {
        // JᵗJ ≈ diag(2e18, 2): well conditioned per row, far apart globally
        let model = |p: &[f64], x: f64| if x < 0.5 { 1e9 * p[0] } else { p[1] };
        let xs = [0.0, 0.0, 1.0, 1.0];
        let ys = [2e9, 2e9, 3.0, 3.0];
        let fit = LevenbergMarquardtSolver::with_defaults()
            .solve(&model, &[1.0, 1.0], &xs, &ys)
            .unwrap();
        assert!(fit.converged);
        assert_abs_diff_eq!(fit.params[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.params[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_trial_outside_model_domain_is_rejected() {
        // From p = 100 the undamped step lands near -222 where ln is NaN;
        // the solver must back off by raising the damping instead of failing
        let model = |p: &[f64], x: f64| p[0].ln() * x;
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 4.0_f64.ln() * x).collect();
        let fit = LevenbergMarquardtSolver::with_defaults()
            .solve(&model, &[100.0], &xs, &ys)
            .unwrap();
        assert!(fit.converged);
        assert_abs_diff_eq!(fit.params[0], 4.0, epsilon = 1e-6);
        // Seven rejections are needed before the damped step stays positive
        assert!(fit.iterations > 7);
    }

    // ========================================
    // Statistics Tests
    // ========================================

    #[test]
    fn test_variance_uses_samples_plus_parameters() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 1.0, 3.0];
        let constant = |p: &[f64], _x: f64| p[0];
        let fit = LevenbergMarquardtSolver::with_defaults()
            .solve(&constant, &[1.0], &xs, &ys)
            .unwrap();
        assert_abs_diff_eq!(fit.params[0], 2.0, epsilon = 1e-6);
        // SSE = 4, n + p = 5
        assert_abs_diff_eq!(fit.variance, 0.8, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.sse(), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.r_squared, 0.0, epsilon = 1e-9);
        // R² ≤ 0 skips the outlier pass
        assert!(fit.outliers.is_empty());
    }

    #[test]
    fn test_single_outlier_flagged() {
        let xs: Vec<f64> = (0..10).map(f64::from).collect();
        let mut ys: Vec<f64> = xs.iter().map(|x| 1.0 + 2.0 * x).collect();
        ys[5] += 10.0;
        let line = |p: &[f64], x: f64| p[0] + p[1] * x;
        let fit = LevenbergMarquardtSolver::with_defaults()
            .solve(&line, &[1.0, 1.0], &xs, &ys)
            .unwrap();

        assert_eq!(fit.outliers.len(), 1);
        assert_eq!(fit.outliers[0].index, 5);
        assert_eq!(fit.outliers[0].x, 5.0);
        assert_eq!(fit.outliers[0].y, 21.0);
        assert!(fit.outliers[0].residual > 8.0);
    }

    // ========================================
    // Non-Convergence Tests
    // ========================================

    #[test]
    fn test_insensitive_model_does_not_converge() {
        let dead = |p: &[f64], _x: f64| p[0] * 0.0;
        let err = LevenbergMarquardtSolver::with_defaults()
            .solve(&dead, &[1.0], &[0.0, 1.0], &[1.0, 2.0])
            .unwrap_err();
        assert!(err.is_non_convergence());
        match err {
            SolverError::NonConvergence {
                iterations,
                last_params,
                ..
            } => {
                assert_eq!(iterations, 0);
                assert_eq!(last_params, vec![1.0]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_budget_exhaustion() {
        let (xs, ys) = exponential_data();
        let solver = LevenbergMarquardtSolver::new(LMConfig::new(2));
        match solver.solve(&exponential, &[1.0, 0.1], &xs, &ys) {
            Err(SolverError::NonConvergence {
                iterations,
                max_iterations,
                last_params,
                ..
            }) => {
                assert_eq!(iterations, 2);
                assert_eq!(max_iterations, 2);
                assert_eq!(last_params.len(), 2);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
    }

    #[test]
    fn test_damping_overflow_does_not_converge() {
        // Every trial cost overflows to infinity, so no step is ever accepted
        // while the step stays above the step-size tolerance
        let line = |p: &[f64], x: f64| p[0] * x;
        let err = LevenbergMarquardtSolver::with_defaults()
            .solve(&line, &[1.0], &[1.0, 2.0], &[1e300, 2e300])
            .unwrap_err();
        match err {
            SolverError::NonConvergence {
                iterations,
                max_iterations,
                reason,
                last_params,
            } => {
                assert!(reason.contains("damping"));
                assert!(iterations < max_iterations);
                assert_eq!(last_params, vec![1.0]);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
    }

    #[test]
    fn test_singular_damped_matrix_is_matrix_error() {
        // Identical Jacobian columns and a damping far below one ulp of JᵗJ
        let sum = |p: &[f64], _x: f64| p[0] + p[1];
        let config = LMConfig::builder().tau(1e-300).build();
        let err = LevenbergMarquardtSolver::new(config)
            .solve(&sum, &[1.0, 1.0], &[0.0, 1.0, 2.0], &[3.0, 3.0, 3.0])
            .unwrap_err();
        assert_eq!(
            err,
            SolverError::Matrix(MatrixError::SingularMatrix { column: 1 })
        );
        assert!(!err.is_non_convergence());
    }

    // ========================================
    // Input Validation Tests
    // ========================================

    #[test]
    fn test_input_errors() {
        let solver = LevenbergMarquardtSolver::with_defaults();
        let line = |p: &[f64], x: f64| p[0] + p[1] * x;

        assert!(matches!(
            solver.solve(&line, &[1.0, 1.0], &[1.0], &[1.0]),
            Err(SolverError::UnderdeterminedSystem {
                samples: 1,
                unknowns: 2
            })
        ));
        assert!(matches!(
            solver.solve(&line, &[1.0, 1.0], &[1.0, 2.0], &[1.0]),
            Err(SolverError::InvalidInput(_))
        ));
        assert!(matches!(
            solver.solve(&line, &[1.0, 1.0], &[], &[]),
            Err(SolverError::InvalidInput(_))
        ));
        assert!(matches!(
            solver.solve(&line, &[], &[1.0], &[1.0]),
            Err(SolverError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_input_error() {
        let solver = LevenbergMarquardtSolver::new(LMConfig::new(0));
        let constant = |p: &[f64], _x: f64| p[0];
        assert!(matches!(
            solver.solve(&constant, &[1.0], &[0.0], &[1.0]),
            Err(SolverError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_finite_initial_model() {
        let log = |p: &[f64], x: f64| p[0] * x.ln();
        assert_eq!(
            LevenbergMarquardtSolver::with_defaults()
                .solve(&log, &[1.0], &[1.0, 0.0], &[0.0, 0.0])
                .unwrap_err(),
            SolverError::NonFiniteModel { sample: 1, x: 0.0 }
        );
    }

    #[test]
    fn test_zero_parameter_rejected() {
        let config = LMConfig::builder()
            .zero_parameter(ZeroParameterPolicy::Reject)
            .build();
        let line = |p: &[f64], x: f64| p[0] + p[1] * x;
        assert_eq!(
            LevenbergMarquardtSolver::new(config)
                .solve(&line, &[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0])
                .unwrap_err(),
            SolverError::ZeroParameter { index: 0 }
        );
    }
}
