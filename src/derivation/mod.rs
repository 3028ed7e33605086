//! derivation — stochastic 0L-system inference from observed generations.
//!
//! Purpose
//! -------
//! Infer the production probabilities of a stochastic 0L-system (a
//! context-free, parallel string-rewriting grammar) from a sequence of
//! strings `[s0, s1, ..., sn]`, each assumed to be one rewrite step of its
//! predecessor.
//!
//! Key behaviors
//! -------------
//! - [`core`]: sequences, productions and derivations; the depth-first
//!   derivation enumerator; production counts, concentration factors and
//!   character statistics.
//! - [`models::best`]: pick the derivation with the largest concentration
//!   factor and emit its maximum-likelihood distribution together with a
//!   calibrated likelihood.
//! - [`models::shared`]: fit a single distribution shared by several
//!   derivation samples by maximizing `Σ_d ∏_j p_j^{c_dj}` under per-symbol
//!   simplex constraints.
//! - [`errors`]: the [`InferenceError`] / [`InferenceResult`] surface.
//!
//! Invariants & assumptions
//! ------------------------
//! - Rewriting is consecutive: the pieces assigned to the characters of
//!   `s_i` are non-empty (except when erasing the only character), appear
//!   in order, and concatenate to `s_{i+1}`.
//! - Rules are not checked for determinism or context-freeness; several
//!   rewrites per symbol are exactly what gets estimated.
//! - Results are returned to the caller and never persisted.
//!
//! Downstream usage
//! ----------------
//! 1. Build a [`Sequence`] with `Sequence::new(strings)`.
//! 2. Q1: [`select_best_derivation`] for a [`BestDerivation`].
//! 3. Q2: collect derivations (from [`enumerate_derivations`] or
//!    elsewhere), then [`fit_shared_distribution`] or
//!    [`fit_with_restarts`].
//!
//! Testing notes
//! -------------
//! - Unit tests sit next to each module; `tests/` drives the full pipeline
//!   through the public API.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    Derivation, Distribution, Position, Production, ProductionCounts, Sequence,
    count_derivations, enumerate_derivations,
};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::models::{
    BestDerivation, FitOptions, MultiStartFit, SharedFit, SharedGrammar, fit_shared_distribution,
    fit_with_restarts, select_best_derivation,
};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::{
        BestDerivation, Derivation, Distribution, FitOptions, InferenceError, InferenceResult,
        MultiStartFit, Position, Production, Sequence, SharedFit, SharedGrammar,
        enumerate_derivations, fit_shared_distribution, fit_with_restarts,
        select_best_derivation,
    };
}
