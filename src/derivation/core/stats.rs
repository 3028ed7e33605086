//! Production statistics and character frequencies.
//!
//! Purpose
//! -------
//! Score derivations and calibrate those scores into probabilities:
//! - [`production_counts`] tallies how often each production is used;
//! - [`concentration_factor`] computes `∏ count^count` over productions, the
//!   derivation-dependent part of the 0L maximum-likelihood formula;
//! - [`character_stats`] computes per-symbol occurrence counts over the
//!   non-final strings and the normalizing constant `1 / ∏ n^n`, the
//!   derivation-independent part.
//!
//! Likelihood of the best derivation = concentration factor × normalizing
//! constant.
//!
//! Conventions
//! -----------
//! - `count^count` grows fast (`144^144` already overflows `f64`), so every
//!   quantity has a log-space companion. Ranking is always exact: `u128`
//!   while the product fits, arbitrary precision beyond.
//! - The empty product is `1`.
use std::cmp::Ordering;
use std::collections::BTreeMap;

use num_bigint::BigUint;

use crate::derivation::core::{
    production::{Derivation, ProductionCounts},
    sequence::Sequence,
};

/// Tally how many positions were assigned to each production.
///
/// The counts always sum to `derivation.len()`.
pub fn production_counts(derivation: &Derivation) -> ProductionCounts {
    let mut counts = ProductionCounts::new();
    for production in derivation.productions() {
        *counts.entry(production.clone()).or_insert(0) += 1;
    }
    counts
}

/// `∏ count^count` over productions, as `f64` (may be `inf` for very large
/// counts; use [`log_concentration_factor`] then).
pub fn concentration_factor(counts: &ProductionCounts) -> f64 {
    counts.values().map(|&c| (c as f64).powi(c as i32)).product()
}

/// `Σ count · ln(count)`, the natural log of [`concentration_factor`].
pub fn log_concentration_factor(counts: &ProductionCounts) -> f64 {
    counts.values().map(|&c| x_ln_x(c)).sum()
}

/// `∏ count^count` in exact integer arithmetic, or `None` on overflow.
pub fn exact_concentration_factor(counts: &ProductionCounts) -> Option<u128> {
    exact_power_product(counts.values().copied())
}

/// Exact value of `∏ count^count`.
///
/// `Big` is only built once the product overflows `u128`, so every `Big`
/// is larger than every `Small` and the derived order is numeric.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExactFactor {
    Small(u128),
    Big(BigUint),
}

impl ExactFactor {
    pub fn of(counts: &ProductionCounts) -> Self {
        match exact_concentration_factor(counts) {
            Some(v) => ExactFactor::Small(v),
            None => ExactFactor::Big(big_power_product(counts.values().copied())),
        }
    }
}

/// Concentration score used to rank derivations.
///
/// `exact` decides the ranking; `log` feeds the probability calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct Concentration {
    pub exact: ExactFactor,
    pub log: f64,
}

impl Concentration {
    pub fn of(counts: &ProductionCounts) -> Self {
        Concentration { exact: ExactFactor::of(counts), log: log_concentration_factor(counts) }
    }

    /// The factor as `f64` (may be `inf` past the `u128` range).
    pub fn value(&self) -> f64 {
        match self.exact {
            ExactFactor::Small(v) => v as f64,
            ExactFactor::Big(_) => self.log.exp(),
        }
    }

    /// Exact total order on scores.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.exact.cmp(&other.exact)
    }
}

/// Character counts of a sequence and the derived normalizing constant.
///
/// Fields
/// ------
/// - `char_counts`: occurrences of every symbol across all non-final strings.
/// - `normalizing_constant`: `1 / ∏ n^n` over observed symbols (may
///   underflow to `0.0`; `log_normalizing_constant` does not).
/// - `log_normalizing_constant`: `-Σ n · ln(n)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterStats {
    pub char_counts: BTreeMap<char, usize>,
    pub normalizing_constant: f64,
    pub log_normalizing_constant: f64,
}

/// Count symbol occurrences over every string except the last and derive
/// the normalizing constant.
///
/// Independent of any derivation. Symbols only enter `char_counts` when
/// observed, so every count is positive.
pub fn character_stats(seq: &Sequence) -> CharacterStats {
    let mut char_counts = BTreeMap::new();
    for source in seq.sources() {
        for &c in source {
            *char_counts.entry(c).or_insert(0) += 1;
        }
    }
    let log_normalizing_constant = -char_counts.values().map(|&n| x_ln_x(n)).sum::<f64>();
    let normalizing_constant = match exact_power_product(char_counts.values().copied()) {
        Some(v) => 1.0 / v as f64,
        None => log_normalizing_constant.exp(),
    };
    CharacterStats { char_counts, normalizing_constant, log_normalizing_constant }
}

fn x_ln_x(n: usize) -> f64 {
    if n == 0 { 0.0 } else { (n as f64) * (n as f64).ln() }
}

fn big_power_product(counts: impl Iterator<Item = usize>) -> BigUint {
    counts.fold(BigUint::from(1u32), |acc, c| {
        acc * BigUint::from(c).pow(u32::try_from(c).unwrap_or(u32::MAX))
    })
}

fn exact_power_product(counts: impl Iterator<Item = usize>) -> Option<u128> {
    let mut acc: u128 = 1;
    for c in counts {
        let exp = u32::try_from(c).ok()?;
        acc = acc.checked_mul((c as u128).checked_pow(exp)?)?;
    }
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::core::production::Production;
    use approx::assert_relative_eq;

    fn counts(pairs: &[(char, &str, usize)]) -> ProductionCounts {
        pairs.iter().map(|&(c, r, n)| (Production::new(c, r), n)).collect()
    }

    #[test]
    // Purpose
    // -------
    // The empty product is one in every representation.
    fn empty_counts_have_unit_concentration() {
        let empty = ProductionCounts::new();

        assert_eq!(concentration_factor(&empty), 1.0);
        assert_eq!(log_concentration_factor(&empty), 0.0);
        assert_eq!(exact_concentration_factor(&empty), Some(1));
    }

    #[test]
    // Purpose
    // -------
    // `production_counts` tallies every position exactly once.
    //
    // Given
    // -----
    // - The `AB|BA` derivation of `['A', 'AB', 'ABBA']`.
    //
    // Expect
    // ------
    // - `A → AB` twice, `B → BA` once; total 3; factor `2^2 · 1^1 = 4`.
    fn production_counts_tally_positions() {
        let d = Derivation::from_rows([
            vec![Production::new('A', "AB")],
            vec![Production::new('A', "AB"), Production::new('B', "BA")],
        ]);

        let c = production_counts(&d);

        assert_eq!(c.values().sum::<usize>(), d.len());
        assert_eq!(c[&Production::new('A', "AB")], 2);
        assert_eq!(c[&Production::new('B', "BA")], 1);
        assert_eq!(concentration_factor(&c), 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Exact and log-space scores agree in small cases, and the exact path
    // switches to arbitrary precision on overflow.
    fn concentration_exact_and_log_paths() {
        let small = counts(&[('A', "AB", 3), ('B', "AB", 3)]);
        let huge = counts(&[('A', "A", 200)]);

        let s = Concentration::of(&small);
        let h = Concentration::of(&huge);

        assert_eq!(s.exact, ExactFactor::Small(729));
        assert_relative_eq!(s.log, 729f64.ln(), epsilon = 1e-12);
        assert_eq!(h.exact, ExactFactor::Big(BigUint::from(200u32).pow(200)));
        assert!(h.log.is_finite());
        assert_eq!(h.compare(&s), Ordering::Greater);
    }

    #[test]
    // Purpose
    // -------
    // Exact comparison resolves ties that log-space rounding could split:
    // `4^4 = 256 = (2^2)^4`.
    fn concentration_ties_compare_equal() {
        let one = Concentration::of(&counts(&[('A', "A", 4)]));
        let four = Concentration::of(&counts(&[
            ('A', "A", 2),
            ('A', "B", 2),
            ('B', "A", 2),
            ('B', "B", 2),
        ]));

        assert_eq!(one.compare(&four), Ordering::Equal);
    }

    #[test]
    // Purpose
    // -------
    // Character counts skip the last string; the constant is `1 / ∏ n^n`.
    //
    // Given
    // -----
    // - `['AB', 'ABAB', 'ABABABAB']`: A and B each occur 3 times in the
    //   first two strings.
    //
    // Expect
    // ------
    // - counts `{A: 3, B: 3}`, constant `1 / 729`.
    fn character_stats_ignore_last_string() {
        let seq = Sequence::new(["AB", "ABAB", "ABABABAB"]).unwrap();

        let stats = character_stats(&seq);

        assert_eq!(stats.char_counts.get(&'A'), Some(&3));
        assert_eq!(stats.char_counts.get(&'B'), Some(&3));
        assert_relative_eq!(stats.normalizing_constant, 1.0 / 729.0, epsilon = 1e-15);
        assert_relative_eq!(stats.log_normalizing_constant, -(729f64.ln()), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Past the `u128` range, different count multisets with equal products
    // must still tie so the first maximizer keeps winning.
    //
    // Given
    // -----
    // - 17 productions used 4 times: `(4^4)^17 = 2^136`.
    // - 68 productions used twice: `(2^2)^68 = 2^136`.
    //
    // Expect
    // ------
    // - Both scores take the arbitrary-precision path and compare `Equal`.
    // - One extra use of a single production breaks the tie.
    fn concentration_ties_beyond_u128_compare_equal() {
        let uniform = |n: usize, count: usize| -> ProductionCounts {
            (0..n).map(|i| (Production::new('A', "A".repeat(i + 1)), count)).collect()
        };
        let fours = uniform(17, 4);
        let twos = uniform(68, 2);
        let mut bumped = twos.clone();
        *bumped.entry(Production::new('A', "A")).or_insert(0) += 1;

        let a = Concentration::of(&fours);
        let b = Concentration::of(&twos);

        assert!(matches!(a.exact, ExactFactor::Big(_)));
        assert_eq!(a.exact, ExactFactor::Big(BigUint::from(2u32).pow(136)));
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert_eq!(Concentration::of(&bumped).compare(&a), Ordering::Greater);
        assert_eq!(a.compare(&Concentration::of(&counts(&[('A', "A", 3)]))), Ordering::Greater);
    }
}
