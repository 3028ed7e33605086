//! optimization — MLE stack, simplex transforms, and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for fitting stochastic grammars,
//! combining an Argmin-backed objective optimizer, numerically stable
//! simplex transforms, and a single error/result surface. Callers implement
//! an objective, choose tolerances, and obtain fitted parameters and
//! diagnostics without touching backend solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **maximizing** objectives `ℓ(θ)`
//!   (`loglik_optimizer`), including solver and stopping-criteria
//!   configuration.
//! - Supply the per-symbol softmax transforms (`numerical_stability`) that
//!   turn simplex-constrained probability vectors into unconstrained `θ`.
//! - Normalize configuration issues, numerical failures, and backend solver
//!   errors into a single enum (`errors::OptError`) with a common result
//!   alias (`OptResult<T>`).
//!
//! Conventions
//! -----------
//! - All solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; user-facing
//!   values are always expressed in terms of `ℓ`.
//! - This module and its submodules avoid I/O and logging, apart from the
//!   opt-in `obs_slog` solver observer.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
