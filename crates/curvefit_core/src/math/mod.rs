//! Numerical building blocks for curve fitting.
//!
//! ## Modules
//!
//! - [`matrix`]: [`DenseMatrix`](matrix::DenseMatrix), row-major dense storage with
//!   arithmetic, LU inversion, norms and descriptive statistics
//! - [`linalg`]: Linear solves via inversion and ordinary least squares through
//!   the normal equations
//! - [`statistics`]: Sums of squares, R² and residual outlier detection
//! - [`rounding`]: Significant-digit rounding for reported parameters

pub mod linalg;
pub mod matrix;
pub mod rounding;
pub mod statistics;

pub use linalg::{least_squares_fit, solve, LinearSolution};
pub use matrix::DenseMatrix;
pub use rounding::RoundToSignificant;
pub use statistics::{detect_outliers, Outlier, OutlierRule};
