//! Error types for implied volatility calculation.
//!
//! Per-quote failures ([`IVError`]) are values inside the result vector and
//! never abort a batch. [`BatchError`] is reserved for faults in the shape of
//! the request itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason code attached to a failed quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCode {
    /// Observed price violates the no-arbitrage bounds.
    OutOfBounds,
    /// Iteration budget exhausted without meeting the tolerance.
    NonConvergence,
    /// A non-finite value appeared in the inputs or during iteration.
    NumericalInstability,
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCode::OutOfBounds => write!(f, "price out of no-arbitrage bounds"),
            FailureCode::NonConvergence => write!(f, "did not converge"),
            FailureCode::NumericalInstability => write!(f, "numerical instability"),
        }
    }
}

/// Per-quote failure of the implied volatility solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IVError {
    /// Price lies outside the no-arbitrage range, so no volatility reproduces it.
    OutOfBounds {
        /// Observed market price.
        price: f64,
        /// Lower no-arbitrage bound.
        lower: f64,
        /// Upper no-arbitrage bound.
        upper: f64,
    },

    /// Solver did not converge within max iterations.
    NonConvergence {
        /// Number of iterations attempted.
        iterations: u32,
        /// Last IV estimate before giving up.
        last_iv: f64,
        /// Price residual `BS(last_iv) - price` at the last iterate.
        residual: f64,
    },

    /// Volatility or residual became NaN or infinite.
    NumericalInstability {
        /// Iterations completed when the fault was detected.
        iterations: u32,
        /// Short description of where the fault appeared.
        detail: String,
    },
}

impl IVError {
    /// Returns the reason code for this failure.
    #[must_use]
    pub fn code(&self) -> FailureCode {
        match self {
            IVError::OutOfBounds { .. } => FailureCode::OutOfBounds,
            IVError::NonConvergence { .. } => FailureCode::NonConvergence,
            IVError::NumericalInstability { .. } => FailureCode::NumericalInstability,
        }
    }
}

impl fmt::Display for IVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IVError::OutOfBounds {
                price,
                lower,
                upper,
            } => {
                write!(
                    f,
                    "price out of no-arbitrage bounds: {price:.6} not in [{lower:.6}, {upper:.6}]"
                )
            }
            IVError::NonConvergence {
                iterations,
                last_iv,
                residual,
            } => {
                write!(
                    f,
                    "did not converge after {iterations} iterations, last IV: {last_iv:.6}, residual: {residual:.3e}"
                )
            }
            IVError::NumericalInstability { iterations, detail } => {
                write!(
                    f,
                    "numerical instability after {iterations} iterations: {detail}"
                )
            }
        }
    }
}

impl std::error::Error for IVError {}

/// Fault in the batch as a whole, raised before any quote is solved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// A parallel input column has a different length than the others.
    LengthMismatch {
        /// Name of the offending column.
        field: &'static str,
        /// Length of the reference column (spot).
        expected: usize,
        /// Length found.
        actual: usize,
    },

    /// Solver configuration cannot produce meaningful results.
    InvalidConfig {
        /// Description of the invalid setting.
        message: String,
    },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::LengthMismatch {
                field,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "column `{field}` has {actual} entries, expected {expected}"
                )
            }
            BatchError::InvalidConfig { message } => {
                write!(f, "invalid solver configuration: {message}")
            }
        }
    }
}

impl std::error::Error for BatchError {}
