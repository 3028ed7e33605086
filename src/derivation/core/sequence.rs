//! Observed string sequences for 0L-system inference.
//!
//! Purpose
//! -------
//! Provide a small, validated container for the generation sequence
//! `[s0, s1, ..., sn]` in which each string is hypothesized to be a one-step
//! rewrite of its predecessor under a shared, unknown grammar.
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`Sequence`] holds **at least two** strings; anything shorter has no
//!   rewrite step and is rejected at construction.
//! - Strings are stored as `Vec<char>` so that character positions are
//!   Unicode scalar values rather than byte offsets.
//! - The sequence is immutable once built.
use crate::derivation::errors::{InferenceError, InferenceResult};

/// `Sequence` — validated list of generations.
///
/// Fields
/// ------
/// - `generations`: `Vec<Vec<char>>`
///   One entry per string, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    generations: Vec<Vec<char>>,
}

impl Sequence {
    /// Build a sequence from anything string-like.
    ///
    /// # Errors
    /// - [`InferenceError::DegenerateSequence`] if fewer than two strings
    ///   are supplied.
    ///
    /// # Examples
    /// ```rust
    /// # use s0l_inference::derivation::core::sequence::Sequence;
    /// let seq = Sequence::new(["A", "AB", "ABBA"]).unwrap();
    /// assert_eq!(seq.len(), 3);
    /// assert!(Sequence::new(["A"]).is_err());
    /// ```
    pub fn new<I, S>(strings: I) -> InferenceResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let generations: Vec<Vec<char>> =
            strings.into_iter().map(|s| s.as_ref().chars().collect()).collect();
        if generations.len() < 2 {
            return Err(InferenceError::DegenerateSequence { len: generations.len() });
        }
        Ok(Sequence { generations })
    }

    /// Number of generations (always ≥ 2).
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Characters of generation `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn generation(&self, index: usize) -> &[char] {
        &self.generations[index]
    }

    /// Every generation except the last: the strings whose characters are
    /// rewritten.
    pub fn sources(&self) -> &[Vec<char>] {
        &self.generations[..self.generations.len() - 1]
    }

    /// Total number of rewritten positions, `Σ_{i < n} |s_i|`.
    ///
    /// Every derivation of this sequence has exactly this many steps.
    pub fn positions(&self) -> usize {
        self.sources().iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Sequences shorter than two generations are degenerate.
    fn new_rejects_short_sequences() {
        assert_eq!(
            Sequence::new(Vec::<String>::new()),
            Err(InferenceError::DegenerateSequence { len: 0 })
        );
        assert_eq!(Sequence::new(["A"]), Err(InferenceError::DegenerateSequence { len: 1 }));
    }

    #[test]
    // Purpose
    // -------
    // `positions` counts characters of every string but the last, by
    // character rather than by byte.
    fn positions_counts_rewritten_characters() {
        let seq = Sequence::new(["AB", "ÅBA", "ABABABAB"]).unwrap();

        assert_eq!(seq.positions(), 5);
        assert_eq!(seq.generation(1), &['Å', 'B', 'A']);
        assert_eq!(seq.sources().len(), 2);
    }
}
