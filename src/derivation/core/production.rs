//! Productions, positions, and derivations.
//!
//! Purpose
//! -------
//! Define the value types the whole crate is keyed on:
//! - [`Production`]: an inferred rule `symbol → rewrite`;
//! - [`Position`]: a `(string_index, char_index)` slot of the sequence;
//! - [`Derivation`]: one complete assignment of a production to every
//!   position of every non-final string.
//!
//! Conventions
//! -----------
//! - `Production` orders by `(symbol, rewrite)`, comparing `char`s and
//!   `String`s by code point. This total order is the canonical indexing
//!   contract between optimizer vectors and distributions.
//! - Derivation steps are stored in string-major, character order, which is
//!   also the order the enumerator assigns them.
use std::collections::BTreeMap;
use std::fmt;

use crate::derivation::{
    core::sequence::Sequence,
    errors::{InferenceError, InferenceResult},
};

/// An inferred rewriting rule `symbol → rewrite`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Production {
    /// Left side: the rewritten character.
    pub symbol: char,
    /// Right side: the substring it rewrites to.
    pub rewrite: String,
}

impl Production {
    pub fn new(symbol: char, rewrite: impl Into<String>) -> Self {
        Production { symbol, rewrite: rewrite.into() }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.symbol, self.rewrite)
    }
}

/// A character slot of the sequence: `char_index` within `string_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub string_index: usize,
    pub char_index: usize,
}

impl Position {
    pub fn new(string_index: usize, char_index: usize) -> Self {
        Position { string_index, char_index }
    }
}

/// One assignment of a production to a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub position: Position,
    pub production: Production,
}

/// Production → number of positions it was assigned to.
pub type ProductionCounts = BTreeMap<Production, usize>;

/// Production → probability. Per-symbol masses sum to one.
pub type Distribution = BTreeMap<Production, f64>;

/// `Derivation` — a complete production assignment for a sequence.
///
/// Invariants
/// ----------
/// - Steps are sorted by position and positions are unique.
/// - For derivations produced by the enumerator, concatenating the rewrites
///   of `s_i` in character order yields `s_{i+1}` exactly. Externally built
///   derivations are only checked for ordering and symbol consistency with
///   [`Derivation::from_steps`]; use [`Derivation::explains`] to check the
///   partition invariant against a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Derivation {
    steps: Vec<Step>,
}

impl Derivation {
    /// Build a derivation from steps in any order.
    ///
    /// Steps are sorted by position.
    ///
    /// # Errors
    /// - [`InferenceError::MalformedDerivation`] if two steps share a
    ///   position.
    pub fn from_steps<I>(steps: I) -> InferenceResult<Self>
    where
        I: IntoIterator<Item = (Position, Production)>,
    {
        let mut steps: Vec<Step> =
            steps.into_iter().map(|(position, production)| Step { position, production }).collect();
        steps.sort_by_key(|s| s.position);
        for (index, pair) in steps.windows(2).enumerate() {
            if pair[0].position == pair[1].position {
                return Err(InferenceError::MalformedDerivation {
                    index: index + 1,
                    reason: "duplicate position",
                });
            }
        }
        Ok(Derivation { steps })
    }

    /// Build a derivation from productions listed per source string, in
    /// character order.
    ///
    /// `rows[i][j]` is the production applied to character `j` of `s_i`.
    pub fn from_rows<R, P>(rows: R) -> Self
    where
        R: IntoIterator<Item = P>,
        P: IntoIterator<Item = Production>,
    {
        let steps = rows
            .into_iter()
            .enumerate()
            .flat_map(|(string_index, row)| {
                row.into_iter().enumerate().map(move |(char_index, production)| Step {
                    position: Position::new(string_index, char_index),
                    production,
                })
            })
            .collect();
        Derivation { steps }
    }

    pub(crate) fn from_sorted_steps(steps: Vec<Step>) -> Self {
        Derivation { steps }
    }

    /// Number of assigned positions.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Productions in position order.
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.steps.iter().map(|s| &s.production)
    }

    /// Production assigned to `position`, if any.
    pub fn get(&self, position: Position) -> Option<&Production> {
        self.steps
            .binary_search_by_key(&position, |s| s.position)
            .ok()
            .map(|i| &self.steps[i].production)
    }

    /// Rewrites assigned to the characters of `s_{string_index}`, in order.
    pub fn rewrites_of(&self, string_index: usize) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .filter(move |s| s.position.string_index == string_index)
            .map(|s| s.production.rewrite.as_str())
    }

    /// Concatenation of the rewrites of `s_{string_index}`; equals
    /// `s_{string_index + 1}` for a valid derivation.
    pub fn reconstruct(&self, string_index: usize) -> String {
        self.rewrites_of(string_index).collect()
    }

    /// Whether this derivation explains `seq`: every position of every
    /// non-final string is assigned a production whose symbol matches the
    /// character there, and each string's rewrites concatenate to its
    /// successor.
    pub fn explains(&self, seq: &Sequence) -> bool {
        if self.steps.len() != seq.positions() {
            return false;
        }
        let mut steps = self.steps.iter();
        for (string_index, source) in seq.sources().iter().enumerate() {
            let mut rebuilt = String::new();
            for (char_index, &symbol) in source.iter().enumerate() {
                match steps.next() {
                    Some(step)
                        if step.position == Position::new(string_index, char_index)
                            && step.production.symbol == symbol =>
                    {
                        rebuilt.push_str(&step.production.rewrite);
                    }
                    _ => return false,
                }
            }
            if !rebuilt.chars().eq(seq.generation(string_index + 1).iter().copied()) {
                return false;
            }
        }
        true
    }
}

impl<'a> IntoIterator for &'a Derivation {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Productions order by symbol first, then rewrite, by code point.
    fn productions_order_by_symbol_then_rewrite() {
        let mut prods = vec![
            Production::new('B', "A"),
            Production::new('A', "B"),
            Production::new('A', "AB"),
            Production::new('A', "A"),
        ];

        prods.sort();

        assert_eq!(
            prods,
            vec![
                Production::new('A', "A"),
                Production::new('A', "AB"),
                Production::new('A', "B"),
                Production::new('B', "A"),
            ]
        );
    }

    #[test]
    // Purpose
    // -------
    // `from_steps` sorts by position and rejects duplicate positions.
    fn from_steps_sorts_and_rejects_duplicates() {
        let d = Derivation::from_steps([
            (Position::new(1, 0), Production::new('A', "A")),
            (Position::new(0, 0), Production::new('A', "AB")),
        ])
        .unwrap();
        assert_eq!(d.steps()[0].position, Position::new(0, 0));
        assert_eq!(d.get(Position::new(1, 0)), Some(&Production::new('A', "A")));

        let dup = Derivation::from_steps([
            (Position::new(0, 0), Production::new('A', "A")),
            (Position::new(0, 0), Production::new('A', "AB")),
        ]);
        assert!(matches!(dup, Err(InferenceError::MalformedDerivation { index: 1, .. })));
    }

    #[test]
    // Purpose
    // -------
    // `explains` accepts a correct partition and rejects a wrong symbol or
    // a wrong concatenation.
    fn explains_checks_symbols_and_partition() {
        let seq = Sequence::new(["A", "AB", "ABBA"]).unwrap();
        let good = Derivation::from_rows([
            vec![Production::new('A', "AB")],
            vec![Production::new('A', "AB"), Production::new('B', "BA")],
        ]);
        let wrong_cut = Derivation::from_rows([
            vec![Production::new('A', "AB")],
            vec![Production::new('A', "AB"), Production::new('B', "B")],
        ]);
        let wrong_symbol = Derivation::from_rows([
            vec![Production::new('A', "AB")],
            vec![Production::new('B', "AB"), Production::new('B', "BA")],
        ]);

        assert!(good.explains(&seq));
        assert_eq!(good.reconstruct(1), "ABBA");
        assert!(!wrong_cut.explains(&seq));
        assert!(!wrong_symbol.explains(&seq));
    }
}
