//! Numerical stability utilities.
//!
//! Provides safe implementations of the simplex transforms used to turn the
//! per-symbol equality constraints of a stochastic grammar into an
//! unconstrained optimization problem.
//!
//! # Provided items
//! - [`MASS_EPS`]: threshold below which a block of probability mass is
//!   treated as zero (and replaced by a uniform block).
//! - [`LOGIT_EPS`]: floor applied to probabilities before taking logs, so a
//!   zero probability maps to a large negative (finite) logit.
//! - [`safe_softmax`]: max-shifted softmax of one block, written in place.
//! - [`grouped_softmax`]: softmax applied independently to every index
//!   group, mapping `θ ∈ ℝⁿ` onto a product of simplices.
//! - [`grouped_logits`]: inverse of [`grouped_softmax`] up to the per-group
//!   additive constant softmax ignores.

use ndarray::{Array1, ArrayView1};

/// Partial sums at or below this value are treated as an empty block.
pub const MASS_EPS: f64 = 1e-12;

/// Smallest probability fed to `ln` when mapping probabilities to logits.
///
/// `ln(1e-12) ≈ -27.6`, far enough out that `softmax` returns a mass well
/// below any tolerance used by the optimizer, while keeping θ finite.
pub const LOGIT_EPS: f64 = 1e-12;

/// Numerically stable softmax of `logits`, written into `out`.
///
/// Subtracts `max(logits)` before exponentiating so no term overflows, and
/// at least one term equals `exp(0) = 1`, so the normalizer never
/// underflows to zero.
///
/// # Panics
/// Panics if `out.len() != logits.len()` (programming error).
pub fn safe_softmax(logits: ArrayView1<f64>, out: &mut [f64]) {
    assert_eq!(logits.len(), out.len(), "softmax output length mismatch");
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for (o, &l) in out.iter_mut().zip(logits.iter()) {
        *o = (l - max).exp();
        total += *o;
    }
    for o in out.iter_mut() {
        *o /= total;
    }
}

/// Apply [`safe_softmax`] independently to each index group of `theta`.
///
/// `groups` must partition `0..theta.len()`; every returned block is a
/// point of the probability simplex, so the result satisfies both the
/// per-group sum-to-one constraints and the `[0, 1]` bounds by construction.
pub fn grouped_softmax(theta: &Array1<f64>, groups: &[Vec<usize>]) -> Array1<f64> {
    let mut probs = Array1::zeros(theta.len());
    let mut block = Vec::new();
    for group in groups {
        let logits = Array1::from_iter(group.iter().map(|&i| theta[i]));
        block.clear();
        block.resize(group.len(), 0.0);
        safe_softmax(logits.view(), &mut block);
        for (&i, &p) in group.iter().zip(block.iter()) {
            probs[i] = p;
        }
    }
    probs
}

/// Map probabilities to logits, `θ_i = ln(max(p_i, LOGIT_EPS))`.
///
/// For any `p` that already lies on each group's simplex,
/// `grouped_softmax(grouped_logits(p), groups) ≈ p` (exact except for
/// entries below `LOGIT_EPS`).
pub fn grouped_logits(probs: &Array1<f64>) -> Array1<f64> {
    probs.mapv(|p| p.max(LOGIT_EPS).ln())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Mass conservation and overflow safety of `safe_softmax`.
    // - Per-group independence of `grouped_softmax`.
    // - The logits/softmax round trip on interior simplex points.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Huge logits must not overflow; the result still sums to one.
    fn safe_softmax_handles_large_logits() {
        let logits = array![1000.0, 999.0, -1000.0];
        let mut out = vec![0.0; 3];

        safe_softmax(logits.view(), &mut out);

        assert_relative_eq!(out.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(out.iter().all(|p| p.is_finite() && *p >= 0.0));
        assert!(out[0] > out[1] && out[1] > out[2]);
    }

    #[test]
    // Purpose
    // -------
    // Each group is normalized on its own, and a singleton group always
    // carries probability one.
    //
    // Given
    // -----
    // - Groups `{0, 2}`, `{1}`, `{3, 4}` over five logits.
    //
    // Expect
    // ------
    // - Per-group sums of one; `p[1] == 1`.
    fn grouped_softmax_normalizes_each_group() {
        let theta = array![0.0, -5.0, 2.0, 1.0, 1.0];
        let groups = vec![vec![0, 2], vec![1], vec![3, 4]];

        let p = grouped_softmax(&theta, &groups);

        assert_relative_eq!(p[0] + p[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[3], 0.5, epsilon = 1e-12);
        assert_relative_eq!(p[4], 0.5, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Logits of an interior simplex point map back onto the same point.
    fn grouped_logits_round_trip_interior_points() {
        let probs = array![0.25, 0.75, 1.0];
        let groups = vec![vec![0, 1], vec![2]];

        let back = grouped_softmax(&grouped_logits(&probs), &groups);

        for i in 0..3 {
            assert_relative_eq!(back[i], probs[i], epsilon = 1e-12);
        }
    }
}
