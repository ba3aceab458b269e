//! # Sales Math
//!
//! Numeric kernels shared by the sales forecasting core.
//! This crate provides the differencing and autoregressive recursion used by
//! the per-store forecasters, and the fixed-decimal helpers used at the
//! response boundary.

use thiserror::Error;

pub mod autoregression;
pub mod rounding;

/// Errors that can occur in forecasting math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for sales math operations
pub type Result<T> = std::result::Result<T, MathError>;

pub use autoregression::{difference, integrate, ArProcess};
pub use rounding::{format_fixed, round_to};
