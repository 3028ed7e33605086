//! loglik_optimizer — argmin-powered objective maximizer.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **maximizing**
//! a likelihood-type objective `ℓ(θ)` over an unconstrained parameter
//! vector. Callers implement a single trait, [`LogLikelihood`], and invoke
//! [`maximize`] to run L-BFGS with a configurable line search, tolerances,
//! and a finite-difference fallback for missing gradients.
//!
//! Key behaviors
//! -------------
//! - Convert user objectives into Argmin cost functions `c(θ) = -ℓ(θ)` via
//!   [`adapter::ArgMinAdapter`].
//! - Expose a single entrypoint [`maximize`] that validates the initial
//!   guess with [`LogLikelihood::check`], builds a solver via [`builders`],
//!   runs it via [`run::run_lbfgs`] and normalizes the result into an
//!   [`OptimOutcome`].
//! - Centralize optimizer configuration ([`Tolerances`], [`MLEOptions`]) and
//!   validation logic ([`validation`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** `ℓ(θ)` by minimizing `-ℓ(θ)`; user
//!   code implements `ℓ(θ)` and `∇ℓ(θ)`, never the cost.
//! - [`LogLikelihood::value`] and [`LogLikelihood::grad`] report invalid
//!   inputs as [`OptError`](crate::optimization::errors::OptError) values,
//!   not panics.
//! - Constraints are the model layer's business: models reparameterize
//!   their constrained space (e.g. per-symbol simplices) into `θ ∈ ℝⁿ`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover adapter sign conventions and the FD fallback,
//!   builder wiring, validation helpers, configuration invariants, and
//!   end-to-end [`maximize`] runs on a toy quadratic.
//! - The shared-grammar fit exercises the whole stack on real derivations.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
