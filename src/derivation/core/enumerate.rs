//! Derivation enumerator: every way each string could have been rewritten
//! into its successor.
//!
//! Purpose
//! -------
//! Enumerate all [`Derivation`]s of a [`Sequence`] under consecutive-substring
//! rewriting: for every consecutive pair `(s, t)`, the characters of `s` are
//! assigned non-overlapping, gap-free pieces of `t`, in order, covering all
//! of `t`.
//!
//! Key behaviors
//! -------------
//! - Depth-first search over `(string_index, char_index)` with a cursor into
//!   the successor string `t`:
//!   - the **last** character of `s` takes the whole remainder `t[cursor..]`
//!     (no choice);
//!   - a **middle** character takes `t[cursor..=end]` for each admissible
//!     `end`, in increasing order, one branch per `end`;
//!   - finishing `s` moves on to `(string_index + 1, 0)` with the cursor
//!     reset; reaching the last string completes a derivation.
//! - The search runs on an explicit stack of open choice points and is
//!   exposed as a lazy [`Iterator`], so callers can stream derivations into
//!   scoring or stop early. Call [`enumerate_derivations`] again to restart.
//!
//! Invariants & assumptions
//! ------------------------
//! - Branches are visited in the same order as the recursive formulation,
//!   so "first maximizer in enumeration order" tie-breaks are reproducible.
//! - A middle character's piece may only end where every remaining
//!   character of `s` can still get a non-empty piece. This prunes branches
//!   that could never complete; the result set and its order are unchanged.
//! - Infeasible branches end silently. An empty non-final string is only
//!   consistent with an empty successor.
//! - Only the last character of a length-1 string can receive an empty
//!   piece (when its successor is empty).
//!
//! Performance
//! -----------
//! - The number of derivations is exponential in the worst case; memory is
//!   `O(positions)` for the stack and the partial assignment, plus one clone
//!   per yielded derivation.
use std::iter::FusedIterator;

use crate::derivation::core::{
    production::{Derivation, Position, Production, Step},
    sequence::Sequence,
};

/// An open choice point: the middle character `char_index` of
/// `s_{string_index}` may still end its piece anywhere in
/// `next_end..=last_end`.
#[derive(Debug, Clone)]
struct Choice {
    string_index: usize,
    char_index: usize,
    start: usize,
    next_end: usize,
    last_end: usize,
    depth: usize,
}

/// Outcome of following the forced moves from some search state.
enum Walk {
    Complete,
    Branched,
    Dead,
}

/// Lazy depth-first enumeration of every derivation of a sequence.
#[derive(Debug, Clone)]
pub struct DerivationIter<'a> {
    seq: &'a Sequence,
    stack: Vec<Choice>,
    partial: Vec<Step>,
    started: bool,
}

/// Enumerate all derivations of `seq`, in depth-first order.
///
/// # Examples
/// ```rust
/// # use s0l_inference::derivation::core::{enumerate::enumerate_derivations, sequence::Sequence};
/// let seq = Sequence::new(["A", "AB", "ABBA"]).unwrap();
/// let all: Vec<_> = enumerate_derivations(&seq).collect();
/// assert_eq!(all.len(), 3);
/// assert!(all.iter().all(|d| d.explains(&seq)));
/// ```
pub fn enumerate_derivations(seq: &Sequence) -> DerivationIter<'_> {
    DerivationIter {
        seq,
        stack: Vec::new(),
        partial: Vec::with_capacity(seq.positions()),
        started: false,
    }
}

/// Number of derivations of `seq`, without keeping any of them.
pub fn count_derivations(seq: &Sequence) -> usize {
    enumerate_derivations(seq).count()
}

impl DerivationIter<'_> {
    /// Apply every forced move from `(string_index, char_index, cursor)`
    /// until the derivation completes, a choice point is opened, or the
    /// branch turns out to be infeasible.
    fn walk(&mut self, mut string_index: usize, mut char_index: usize, mut cursor: usize) -> Walk {
        loop {
            if string_index == self.seq.len() - 1 {
                return Walk::Complete;
            }
            let s = self.seq.generation(string_index);
            let t = self.seq.generation(string_index + 1);

            if char_index == s.len() {
                if s.is_empty() && !t.is_empty() {
                    return Walk::Dead;
                }
                string_index += 1;
                char_index = 0;
                cursor = 0;
                continue;
            }

            if char_index == s.len() - 1 {
                let rewrite: String = t[cursor..].iter().collect();
                self.push_step(string_index, char_index, s[char_index], rewrite);
                char_index += 1;
                cursor = t.len();
                continue;
            }

            // Each of the `s.len() - char_index` characters from here on
            // needs at least one character of `t`.
            return match t.len().checked_sub(s.len() - char_index) {
                Some(last_end) if last_end >= cursor => {
                    self.stack.push(Choice {
                        string_index,
                        char_index,
                        start: cursor,
                        next_end: cursor,
                        last_end,
                        depth: self.partial.len(),
                    });
                    Walk::Branched
                }
                _ => Walk::Dead,
            };
        }
    }

    fn push_step(&mut self, string_index: usize, char_index: usize, symbol: char, rewrite: String) {
        self.partial.push(Step {
            position: Position::new(string_index, char_index),
            production: Production { symbol, rewrite },
        });
    }

    fn emit(&self) -> Derivation {
        Derivation::from_sorted_steps(self.partial.clone())
    }
}

impl Iterator for DerivationIter<'_> {
    type Item = Derivation;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if let Walk::Complete = self.walk(0, 0, 0) {
                return Some(self.emit());
            }
        }

        loop {
            let top = self.stack.last_mut()?;
            if top.next_end > top.last_end {
                self.stack.pop();
                continue;
            }
            let end = top.next_end;
            top.next_end += 1;
            let Choice { string_index, char_index, start, depth, .. } = *top;

            self.partial.truncate(depth);
            let s = self.seq.generation(string_index);
            let t = self.seq.generation(string_index + 1);
            let rewrite: String = t[start..=end].iter().collect();
            self.push_step(string_index, char_index, s[char_index], rewrite);

            if let Walk::Complete = self.walk(string_index, char_index + 1, end + 1) {
                return Some(self.emit());
            }
        }
    }
}

impl FusedIterator for DerivationIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Hand-counted oracles for small sequences.
    // - The partition invariant and full position coverage of every result.
    // - Depth-first visitation order (increasing piece ends).
    // - Infeasible inputs (too-short successors, empty strings).
    // - Laziness / restartability.
    // -------------------------------------------------------------------------

    fn seq(strings: &[&str]) -> Sequence {
        Sequence::new(strings.iter().copied()).expect("test sequences have ≥ 2 strings")
    }

    #[test]
    // Purpose
    // -------
    // Regression oracle for `['A', 'AB', 'ABBA']`.
    //
    // Given
    // -----
    // - `A → AB` is forced; `AB → ABBA` splits after 1, 2 or 3 characters.
    //
    // Expect
    // ------
    // - Exactly 3 derivations, in order `A|BBA`, `AB|BA`, `ABB|A`.
    fn abba_has_three_derivations_in_dfs_order() {
        let s = seq(&["A", "AB", "ABBA"]);

        let all: Vec<Derivation> = enumerate_derivations(&s).collect();

        assert_eq!(all.len(), 3);
        let cuts: Vec<Vec<&str>> = all.iter().map(|d| d.rewrites_of(1).collect()).collect();
        assert_eq!(cuts, vec![vec!["A", "BBA"], vec!["AB", "BA"], vec!["ABB", "A"]]);
        for d in &all {
            assert_eq!(d.get(Position::new(0, 0)), Some(&Production::new('A', "AB")));
        }
    }

    #[test]
    // Purpose
    // -------
    // Counts match compositions: `AB → ABAB` has C(3,1) = 3 splits and
    // `ABAB → ABABABAB` has C(7,3) = 35, so 105 derivations in total.
    fn abab_sequence_count_matches_compositions() {
        let s = seq(&["AB", "ABAB", "ABABABAB"]);

        assert_eq!(count_derivations(&s), 105);
    }

    #[test]
    // Purpose
    // -------
    // Every derivation satisfies the partition invariant and assigns every
    // position exactly once.
    fn every_derivation_partitions_each_successor() {
        let s = seq(&["AB", "ABA", "ABABA", "ABABAAABB"]);
        let mut n = 0;

        for d in enumerate_derivations(&s) {
            n += 1;
            assert_eq!(d.len(), s.positions());
            for i in 0..s.len() - 1 {
                let expected: String = s.generation(i + 1).iter().collect();
                assert_eq!(d.reconstruct(i), expected);
            }
            assert!(d.explains(&s));
        }
        assert!(n > 0);
    }

    #[test]
    // Purpose
    // -------
    // A single-character first string with two generations has no choice
    // point: exactly one derivation.
    fn single_character_source_yields_one_derivation() {
        let s = seq(&["A", "ABBA"]);

        let all: Vec<Derivation> = enumerate_derivations(&s).collect();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reconstruct(0), "ABBA");
    }

    #[test]
    // Purpose
    // -------
    // Successors shorter than their source cannot give every character a
    // non-empty piece: the enumeration is empty rather than an error.
    fn too_short_successor_yields_nothing() {
        assert_eq!(count_derivations(&seq(&["ABC", "AB"])), 0);
        assert_eq!(count_derivations(&seq(&["AB", "ABAB", "A"])), 0);
    }

    #[test]
    // Purpose
    // -------
    // Empty strings: an empty source only explains an empty successor, and
    // a lone character may be erased.
    fn empty_strings_follow_partition_invariant() {
        assert_eq!(count_derivations(&seq(&["", "A"])), 0);
        assert_eq!(count_derivations(&seq(&["", ""])), 1);

        let erased: Vec<Derivation> = enumerate_derivations(&seq(&["A", ""])).collect();
        assert_eq!(erased.len(), 1);
        assert_eq!(erased[0].get(Position::new(0, 0)), Some(&Production::new('A', "")));
    }

    #[test]
    // Purpose
    // -------
    // The iterator is lazy and restartable: taking a prefix and restarting
    // reproduces the same derivations.
    fn enumeration_is_lazy_and_restartable() {
        let s = seq(&["AB", "ABAB", "ABABABAB"]);

        let first_two: Vec<Derivation> = enumerate_derivations(&s).take(2).collect();
        let again: Vec<Derivation> = enumerate_derivations(&s).take(2).collect();

        assert_eq!(first_two, again);
        assert_ne!(first_two[0], first_two[1]);
    }
}
