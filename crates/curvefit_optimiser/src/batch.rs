//! Fitting many independent datasets.
//!
//! Each [`FitProblem`] is solved independently with the same solver. With the
//! `parallel` feature (default) problems are distributed over Rayon's
//! work-stealing pool; otherwise they run sequentially. Results keep the input
//! order either way.

use curvefit_core::types::SolverError;

use crate::levenberg_marquardt::{LMFit, LevenbergMarquardtSolver};
use crate::model::ResidualModel;

/// One dataset to fit.
#[derive(Debug, Clone)]
pub struct FitProblem<M> {
    /// Model to fit.
    pub model: M,
    /// Initial parameter guess.
    pub initial_params: Vec<f64>,
    /// Sample abscissae.
    pub x_values: Vec<f64>,
    /// Sample observations.
    pub y_values: Vec<f64>,
}

impl<M: ResidualModel> FitProblem<M> {
    /// Create a problem.
    pub fn new(model: M, initial_params: Vec<f64>, x_values: Vec<f64>, y_values: Vec<f64>) -> Self {
        Self {
            model,
            initial_params,
            x_values,
            y_values,
        }
    }

    /// Solve this problem alone.
    pub fn solve(&self, solver: &LevenbergMarquardtSolver) -> Result<LMFit, SolverError> {
        solver.solve(
            &self.model,
            &self.initial_params,
            &self.x_values,
            &self.y_values,
        )
    }
}

/// Fit every problem, preserving order.
///
/// A failing problem does not affect the others.
#[cfg(feature = "parallel")]
pub fn fit_batch<M>(
    solver: &LevenbergMarquardtSolver,
    problems: &[FitProblem<M>],
) -> Vec<Result<LMFit, SolverError>>
where
    M: ResidualModel + Sync,
{
    use rayon::prelude::*;

    problems.par_iter().map(|p| p.solve(solver)).collect()
}

/// Fit every problem, preserving order.
///
/// A failing problem does not affect the others.
#[cfg(not(feature = "parallel"))]
pub fn fit_batch<M>(
    solver: &LevenbergMarquardtSolver,
    problems: &[FitProblem<M>],
) -> Vec<Result<LMFit, SolverError>>
where
    M: ResidualModel + Sync,
{
    problems.iter().map(|p| p.solve(solver)).collect()
}
