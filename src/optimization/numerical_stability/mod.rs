//! numerical_stability — simplex reparameterization helpers.
//!
//! Purpose
//! -------
//! Collect the numerically stable transforms that map an unconstrained
//! optimizer vector `θ` onto a product of probability simplices (one per
//! grammar symbol) and back. With these, the per-symbol equality
//! constraints `Σ_r p(c → r) = 1` and the bounds `0 ≤ p ≤ 1` hold by
//! construction, and the optimizer layer can stay unconstrained.
//!
//! Invariants & assumptions
//! ------------------------
//! - Index groups passed to [`grouped_softmax`] partition `0..θ.len()`;
//!   building them is the model layer's job.
//! - All transforms assume finite inputs; validation happens upstream.
//!
//! Conventions
//! -----------
//! - Softmax is max-shifted, so it never overflows and the normalizer is
//!   always ≥ 1.
//! - This module never logs, performs I/O, or touches global state.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    LOGIT_EPS, MASS_EPS, grouped_logits, grouped_softmax, safe_softmax,
};

pub mod prelude {
    pub use super::transformations::{
        LOGIT_EPS, MASS_EPS, grouped_logits, grouped_softmax, safe_softmax,
    };
}
