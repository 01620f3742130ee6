//! Core error types.
//!
//! This module provides:
//! - `error`: Structured error types for matrix algebra, least-squares solvers
//!   and configuration loading
//!
//! # Re-exports
//!
//! [`MatrixError`], [`SolverError`] and [`ConfigError`] are re-exported at this
//! module level.

pub mod error;

pub use error::{ConfigError, MatrixError, SolverError};
