//! # curvefit_core: Dense Matrix Foundation for Curve Fitting
//!
//! ## Foundation Role
//!
//! curvefit_core is the bottom layer of the curvefit workspace, providing:
//! - Dense row-major matrices with LU inversion (`math::matrix`)
//! - Linear solves and ordinary least squares (`math::linalg`)
//! - Fit statistics and outlier detection (`math::statistics`)
//! - Significant-digit rounding (`math::rounding`)
//! - Error types: `MatrixError`, `SolverError` (`types::error`)
//!
//! `curvefit_optimiser` (Levenberg-Marquardt) and `curvefit_regression`
//! (linear regression diagnostics) consume only the types exported here.
//!
//! ## Usage Examples
//!
//! ```rust
//! use curvefit_core::math::matrix::DenseMatrix;
//! use curvefit_core::types::MatrixError;
//!
//! let a = DenseMatrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
//! let b = DenseMatrix::new(3, 1).unwrap();
//!
//! // Incompatible inner dimensions are reported, never panicked on
//! assert!(matches!(a.multiply(&b), Err(MatrixError::ShapeMismatch { .. })));
//!
//! let inv = a.invert().unwrap();
//! assert!((inv.get(0, 0).unwrap() - 0.6).abs() < 1e-12);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialisation for `DenseMatrix`, statistics and error types

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod types;
