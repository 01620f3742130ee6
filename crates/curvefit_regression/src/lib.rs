//! # curvefit_regression
//!
//! Multiple linear regression for curvefit.
//!
//! Fits `y = b₀ + b₁x₁ + … + b_kx_k` through the normal equations in
//! `curvefit_core` and reports everything needed to judge the fit:
//!
//! - R², adjusted R², residual variance and standard deviation
//! - per-sample residuals and predictions, plus outliers
//! - variance inflation factors and pairwise R² between independents
//! - dependents corrected for all but one independent, for partial plots
//!
//! ## Modules
//!
//! - `linear`: [`LinearRegression`] and its [`LinearFit`]
//! - `diagnostics`: collinearity measures usable on their own
//! - `config`: [`RegressionConfig`] outlier policy with TOML loading
//! - `error`: [`RegressionError`]

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod linear;

pub use config::{ConfigError, RegressionConfig};
pub use diagnostics::{correlation_matrix, variance_inflation_factors};
pub use error::RegressionError;
pub use linear::{LinearFit, LinearRegression};
