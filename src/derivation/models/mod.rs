//! models — the two estimators built on top of [`core`](super::core).
//!
//! - [`best`]: Q1, the maximum-likelihood distribution of the single most
//!   concentrated derivation of one sequence.
//! - [`shared`]: Q2, one distribution fitted jointly to several derivation
//!   samples, with a seeded multi-start wrapper.

pub mod best;
pub mod shared;

pub use self::best::{BestDerivation, select_best_derivation};
pub use self::shared::{
    FitOptions, LogScale, MultiStartFit, SharedFit, SharedGrammar, fit_shared_distribution,
    fit_with_restarts,
};
