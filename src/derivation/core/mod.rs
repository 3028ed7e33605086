//! core — sequences, derivations, enumeration, and production statistics.
//!
//! Purpose
//! -------
//! Collect the building blocks both estimators rely on: the validated
//! [`Sequence`] container, the [`Production`] / [`Derivation`] value types,
//! the lazy derivation enumerator, and the counting helpers that score
//! derivations and normalize them into probabilities.
//!
//! Key behaviors
//! -------------
//! - [`enumerate_derivations`] streams every consecutive-substring
//!   derivation of a sequence in depth-first order.
//! - [`production_counts`] and [`Concentration`] score a derivation by
//!   `∏ count^count`, ranked in exact integer arithmetic.
//! - [`character_stats`] derives the sequence-wide normalizing constant.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based: `Position { string_index, char_index }` addresses
//!   character `char_index` of generation `string_index`.
//! - Productions order by `(symbol, rewrite)`; maps keyed by production are
//!   `BTreeMap`s, so iteration order is canonical.
//! - Nothing here logs or performs I/O.

pub mod enumerate;
pub mod production;
pub mod sequence;
pub mod stats;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::enumerate::{DerivationIter, count_derivations, enumerate_derivations};
pub use self::production::{
    Derivation, Distribution, Position, Production, ProductionCounts, Step,
};
pub use self::sequence::Sequence;
pub use self::stats::{
    CharacterStats, Concentration, ExactFactor, character_stats, concentration_factor,
    exact_concentration_factor, log_concentration_factor, production_counts,
};

pub mod prelude {
    pub use super::{
        CharacterStats, Derivation, Distribution, Position, Production, ProductionCounts,
        Sequence, character_stats, count_derivations, enumerate_derivations,
        production_counts,
    };
}
