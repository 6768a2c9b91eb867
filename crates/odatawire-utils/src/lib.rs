//! Name handling shared by the writer: case homogenization, English
//! singular/plural inflection, and the ranked fuzzy resolver built on them.

mod case;
mod plural;
mod resolve;

// re-exports
pub use case::homogenize;
pub use plural::{ENGLISH_PLURALIZER, EnglishPluralizer, Pluralizer};
pub use resolve::{MatchRank, NameMatch, NameResolver};
