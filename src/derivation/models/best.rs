//! Q1: maximum-likelihood distribution of the single best derivation.
//!
//! Purpose
//! -------
//! Pick the derivation of a [`Sequence`] with the largest concentration
//! factor, turn its production counts into a distribution, and calibrate the
//! derivation's likelihood with the sequence's character statistics.
//!
//! Key behaviors
//! -------------
//! - Derivations are streamed from the enumerator and scored one by one;
//!   only the running best is kept in memory.
//! - Ties keep the **first** maximizer in enumeration order (strict `>`).
//! - `distribution[c → r] = count(c → r) / char_counts[c]`, where
//!   `char_counts` are the sequence-wide occurrences of `c` in every
//!   non-final string.
//! - `final_probability = ∏ count^count / ∏ n^n`, computed in log space.
//!
//! Invariants & assumptions
//! ------------------------
//! - For a complete derivation, the counts of productions of `c` sum to the
//!   occurrences of `c`, so each symbol's mass sums to one.
//! - `final_probability ∈ (0, 1]` up to underflow.
use crate::derivation::{
    core::{
        enumerate::enumerate_derivations,
        production::{Derivation, Distribution, ProductionCounts},
        sequence::Sequence,
        stats::{Concentration, character_stats, production_counts},
    },
    errors::{InferenceError, InferenceResult},
};

/// Result of [`select_best_derivation`].
///
/// Fields
/// ------
/// - `distribution`: estimated `p(c → r)` for every production the best
///   derivation uses.
/// - `derivation`: the winning derivation itself.
/// - `final_probability`: likelihood of the winning derivation under its own
///   distribution.
/// - `concentration_factor`: `∏ count^count` of the winner (may be `inf` for
///   very long sequences; `final_probability` is computed in log space and
///   is unaffected).
/// - `derivations_considered`: size of the enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct BestDerivation {
    pub distribution: Distribution,
    pub derivation: Derivation,
    pub final_probability: f64,
    pub concentration_factor: f64,
    pub derivations_considered: usize,
}

/// Select the most concentrated derivation of `seq` and its
/// maximum-likelihood distribution.
///
/// # Errors
/// - [`InferenceError::NoDerivation`] if no derivation explains `seq`.
/// - [`InferenceError::ZeroSymbolCount`] if a used symbol never occurs in a
///   non-final string (only possible for inconsistent input).
///
/// # Examples
/// ```rust
/// # use s0l_inference::derivation::{core::{production::Production, sequence::Sequence}, models::best::select_best_derivation};
/// let seq = Sequence::new(["AB", "ABAB", "ABABABAB"]).unwrap();
/// let best = select_best_derivation(&seq).unwrap();
/// assert_eq!(best.distribution[&Production::new('B', "BAB")], 1.0);
/// assert!((best.final_probability - 1.0).abs() < 1e-12);
/// ```
pub fn select_best_derivation(seq: &Sequence) -> InferenceResult<BestDerivation> {
    let mut best: Option<(Derivation, ProductionCounts, Concentration)> = None;
    let mut considered = 0usize;

    for derivation in enumerate_derivations(seq) {
        considered += 1;
        let counts = production_counts(&derivation);
        let score = Concentration::of(&counts);
        let improves = match &best {
            None => true,
            Some((_, _, incumbent)) => score.compare(incumbent).is_gt(),
        };
        if improves {
            best = Some((derivation, counts, score));
        }
    }

    let (derivation, counts, score) = best.ok_or(InferenceError::NoDerivation)?;
    let stats = character_stats(seq);

    let mut distribution = Distribution::new();
    for (production, &count) in &counts {
        let total = stats.char_counts.get(&production.symbol).copied().unwrap_or(0);
        if total == 0 {
            return Err(InferenceError::ZeroSymbolCount { symbol: production.symbol });
        }
        distribution.insert(production.clone(), count as f64 / total as f64);
    }

    let final_probability = (score.log + stats.log_normalizing_constant).exp();

    Ok(BestDerivation {
        distribution,
        derivation,
        final_probability,
        concentration_factor: score.value(),
        derivations_considered: considered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::core::production::Production;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Fixed oracles for `['A', 'AB', 'ABBA']` and `['AB', 'ABAB', 'ABABABAB']`.
    // - Per-symbol normalization of the emitted distribution.
    // - First-maximizer tie-breaking.
    // - `NoDerivation` on inconsistent sequences.
    // -------------------------------------------------------------------------

    fn seq(strings: &[&str]) -> Sequence {
        Sequence::new(strings.iter().copied()).expect("test sequences have ≥ 2 strings")
    }

    fn symbol_mass(d: &Distribution, symbol: char) -> f64 {
        d.iter().filter(|(p, _)| p.symbol == symbol).map(|(_, &v)| v).sum()
    }

    #[test]
    // Purpose
    // -------
    // Regression oracle for `['A', 'AB', 'ABBA']`.
    //
    // Given
    // -----
    // - Three derivations with concentrations 1, 4 (`AB|BA`) and 1.
    //
    // Expect
    // ------
    // - The `AB|BA` derivation wins: `A → AB` ×2, `B → BA` ×1.
    // - Character counts are `{A: 2, B: 1}`, so the distribution is
    //   `{A → AB: 1, B → BA: 1}` and the final probability is `4 / 4 = 1`.
    fn abba_oracle() {
        let best = select_best_derivation(&seq(&["A", "AB", "ABBA"])).unwrap();

        assert_eq!(best.derivations_considered, 3);
        assert_eq!(best.concentration_factor, 4.0);
        assert_eq!(best.derivation.reconstruct(1), "ABBA");
        assert_eq!(best.derivation.rewrites_of(1).collect::<Vec<_>>(), vec!["AB", "BA"]);
        assert_eq!(best.distribution.len(), 2);
        assert_relative_eq!(best.distribution[&Production::new('A', "AB")], 1.0);
        assert_relative_eq!(best.distribution[&Production::new('B', "BA")], 1.0);
        assert_relative_eq!(best.final_probability, 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Regression oracle for `['AB', 'ABAB', 'ABABABAB']`.
    //
    // Given
    // -----
    // - 105 derivations. Three deterministic grammars explain every
    //   position with concentration `3^3 · 3^3 = 729`:
    //   `{A → A, B → BAB}`, `{A → AB, B → AB}` and `{A → ABA, B → B}`,
    //   found in that order.
    //
    // Expect
    // ------
    // - The first of the tied grammars wins, with probability one.
    fn abab_oracle_keeps_first_of_tied_grammars() {
        let best = select_best_derivation(&seq(&["AB", "ABAB", "ABABABAB"])).unwrap();

        assert_eq!(best.derivations_considered, 105);
        assert_eq!(best.concentration_factor, 729.0);
        let mut expected = Distribution::new();
        expected.insert(Production::new('A', "A"), 1.0);
        expected.insert(Production::new('B', "BAB"), 1.0);
        assert_eq!(best.distribution, expected);
        assert_relative_eq!(best.final_probability, 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A stochastic winner: per-symbol masses sum to one and the calibrated
    // probability drops below one.
    //
    // Given
    // -----
    // - `['A', 'AA', 'AAAB']`: `A → AA` is forced, then `AA → AAAB` splits
    //   as `A|AAB`, `AA|AB` or `AAA|B`. Only `AA|AB` reuses `A → AA`, for a
    //   concentration of `2^2 · 1^1 = 4` against `1` for the others.
    //
    // Expect
    // ------
    // - `A` occurs 3 times in the non-final strings, so
    //   `{A → AA: 2/3, A → AB: 1/3}` and final probability `4 / 27`.
    fn stochastic_winner_is_normalized_per_symbol() {
        let best = select_best_derivation(&seq(&["A", "AA", "AAAB"])).unwrap();

        assert_eq!(best.derivations_considered, 3);
        assert_eq!(best.concentration_factor, 4.0);
        assert_eq!(best.derivation.rewrites_of(1).collect::<Vec<_>>(), vec!["AA", "AB"]);
        assert_relative_eq!(best.distribution[&Production::new('A', "AA")], 2.0 / 3.0);
        assert_relative_eq!(best.distribution[&Production::new('A', "AB")], 1.0 / 3.0);
        assert_relative_eq!(symbol_mass(&best.distribution, 'A'), 1.0, epsilon = 1e-12);
        assert_relative_eq!(best.final_probability, 4.0 / 27.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Equal concentrations keep the first derivation in enumeration order.
    //
    // Given
    // -----
    // - `['AB', 'ABC']`: `A|BC` and `AB|C` both score `1`.
    //
    // Expect
    // ------
    // - `A|BC` wins: `{A → A: 1, B → BC: 1}`.
    fn ties_keep_first_derivation() {
        let best = select_best_derivation(&seq(&["AB", "ABC"])).unwrap();

        assert_eq!(best.derivations_considered, 2);
        assert_eq!(best.derivation.rewrites_of(0).collect::<Vec<_>>(), vec!["A", "BC"]);
        assert_relative_eq!(best.distribution[&Production::new('A', "A")], 1.0);
        assert_relative_eq!(best.distribution[&Production::new('B', "BC")], 1.0);
        assert_relative_eq!(best.final_probability, 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // An inconsistent sequence surfaces as `NoDerivation`.
    fn inconsistent_sequence_has_no_derivation() {
        assert_eq!(
            select_best_derivation(&seq(&["ABC", "AB"])),
            Err(InferenceError::NoDerivation)
        );
    }
}
