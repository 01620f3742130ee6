//! # curvefit_optimiser
//!
//! Nonlinear least-squares curve fitting for curvefit.
//!
//! Builds on `curvefit_core` (dense matrices, fit statistics) to fit a scalar
//! model `ŷ = f(p, x)` to observed samples.
//!
//! ## Modules
//!
//! - `config`: [`LMConfig`] policy constants, presets, builder and TOML loading
//! - `model`: the [`ResidualModel`] abstraction over `Fn(&[f64], f64) -> f64`
//! - `jacobian`: central-difference [`JacobianEstimator`]
//! - `levenberg_marquardt`: the [`LevenbergMarquardtSolver`] and its [`LMFit`]
//! - `batch`: independent fits over many datasets, parallel with `parallel`
//!
//! ## Feature Flags
//!
//! - `parallel` (default): Rayon-backed [`batch::fit_batch`]
//! - `serde`: serialisable fit results
//!
//! ## Logging
//!
//! The solver emits `tracing` events (`debug!` per iteration, `info!` on
//! convergence, `warn!` on non-convergence and outliers). No subscriber is
//! installed here.

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod batch;
pub mod config;
pub mod jacobian;
pub mod levenberg_marquardt;
pub mod model;

pub use config::{ConfigError, JacobianConfig, LMConfig, LMConfigBuilder, ZeroParameterPolicy};
pub use jacobian::JacobianEstimator;
pub use levenberg_marquardt::{LMFit, LevenbergMarquardtSolver, Termination};
pub use model::ResidualModel;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::batch::{fit_batch, FitProblem};
    pub use crate::config::{LMConfig, ZeroParameterPolicy};
    pub use crate::levenberg_marquardt::{LMFit, LevenbergMarquardtSolver, Termination};
    pub use crate::model::ResidualModel;
    pub use curvefit_core::types::SolverError;
}
