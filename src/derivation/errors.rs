//! Errors for 0L-system inference (sequence validation, derivation
//! selection, shared-grammar fitting).
//!
//! This module defines the domain error type, [`InferenceError`], used across
//! the Rust core and, behind the `python-bindings` feature, converted to a
//! Python `ValueError`.
//!
//! ## Conventions
//! - **Indices are 0-based.**
//! - Structural infeasibility inside the enumerator is *not* an error: dead
//!   branches simply yield nothing. Only an entirely empty enumeration
//!   surfaces, as [`InferenceError::NoDerivation`].
//! - Optimizer non-convergence is reported as data (`success = false`) by the
//!   fitting routines; only configuration problems become errors here.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

use crate::optimization::errors::OptError;

/// Crate-wide result alias for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Unified error type for 0L-system inference.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Input validation ----
    /// A sequence needs at least two generations to contain a rewrite step.
    DegenerateSequence { len: usize },

    /// A symbol needed as a divisor has zero observed occurrences.
    ZeroSymbolCount { symbol: char },

    // ---- Derivations ----
    /// Every branch of the enumeration was infeasible.
    NoDerivation,

    /// A derivation step does not line up with the positions it claims.
    MalformedDerivation { index: usize, reason: &'static str },

    /// The shared-grammar fit received no productions to estimate.
    NoProductions,

    // ---- Initial guesses ----
    /// Explicit initial guess has the wrong length.
    DimensionMismatch { expected: usize, found: usize },

    /// Initial guess entries must be finite and non-negative.
    InvalidInitialGuess { index: usize, value: f64, reason: &'static str },

    // ---- Optimizer ----
    /// Optimizer configuration or backend error.
    Optimizer { text: String },
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input validation ----
            InferenceError::DegenerateSequence { len } => {
                write!(f, "Sequence must contain at least 2 strings; got {len}.")
            }
            InferenceError::ZeroSymbolCount { symbol } => {
                write!(f, "Symbol '{symbol}' has zero observed occurrences.")
            }

            // ---- Derivations ----
            InferenceError::NoDerivation => {
                write!(f, "No derivation is consistent with the sequence.")
            }
            InferenceError::MalformedDerivation { index, reason } => {
                write!(f, "Malformed derivation step {index}: {reason}")
            }
            InferenceError::NoProductions => {
                write!(f, "No productions to fit: the derivation list is empty.")
            }

            // ---- Initial guesses ----
            InferenceError::DimensionMismatch { expected, found } => {
                write!(
                    f,
                    "Initial guess length ({found}) does not match the number of productions ({expected})."
                )
            }
            InferenceError::InvalidInitialGuess { index, value, reason } => {
                write!(f, "Invalid initial guess at index {index}: {value}. {reason}")
            }

            // ---- Optimizer ----
            InferenceError::Optimizer { text } => {
                write!(f, "Optimizer error: {text}")
            }
        }
    }
}

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Optimizer { text: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<InferenceError> for PyErr {
    fn from(err: InferenceError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Optimizer errors surface through `InferenceError::Optimizer` with the
    // optimizer's own message.
    fn optimizer_errors_keep_their_message() {
        let err = OptError::NoTolerancesProvided;
        let text = err.to_string();

        let wrapped = InferenceError::from(err);

        assert_eq!(wrapped, InferenceError::Optimizer { text: text.clone() });
        assert!(wrapped.to_string().ends_with(&text));
    }

    #[test]
    // Purpose
    // -------
    // Messages name the offending value so callers can act on them.
    fn display_names_offending_values() {
        let degenerate = InferenceError::DegenerateSequence { len: 1 }.to_string();
        let mismatch = InferenceError::DimensionMismatch { expected: 4, found: 2 }.to_string();
        let symbol = InferenceError::ZeroSymbolCount { symbol: 'B' }.to_string();

        assert!(degenerate.contains("got 1"));
        assert!(mismatch.contains("(2)") && mismatch.contains("(4)"));
        assert!(symbol.contains("'B'"));
    }
}
