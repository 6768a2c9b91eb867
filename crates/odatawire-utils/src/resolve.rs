use crate::{case::homogenize, plural::Pluralizer};
use derive_more::Display;
use std::fmt;

///
/// MatchRank
///
/// How closely a candidate name matched. Lower ranks win.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MatchRank {
    #[display("exact")]
    Exact,
    #[display("case_insensitive")]
    CaseInsensitive,
    #[display("plural_normalized")]
    PluralNormalized,
}

///
/// NameMatch
///
/// Outcome of resolving one name against a candidate set.
/// Only `Found` identifies a member; `Ambiguous` and `NotFound` both mean
/// "no such member" to callers.
///

#[derive(Debug, Eq, PartialEq)]
pub enum NameMatch<T> {
    Found { item: T, rank: MatchRank },
    Ambiguous { rank: MatchRank, candidates: Vec<T> },
    NotFound,
}

impl<T> NameMatch<T> {
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found { item, .. } => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    #[must_use]
    pub const fn rank(&self) -> Option<MatchRank> {
        match self {
            Self::Found { rank, .. } | Self::Ambiguous { rank, .. } => Some(*rank),
            Self::NotFound => None,
        }
    }
}

///
/// NameResolver
///
/// Fuzzy member lookup: exact, then case/separator-insensitive, then
/// singular/plural-normalized. The best rank wins; several candidates
/// sharing the best rank is an ambiguity, never an arbitrary pick.
///

#[derive(Clone, Copy)]
pub struct NameResolver<'p> {
    pluralizer: Option<&'p dyn Pluralizer>,
}

impl<'p> NameResolver<'p> {
    #[must_use]
    pub const fn new(pluralizer: Option<&'p dyn Pluralizer>) -> Self {
        Self { pluralizer }
    }

    /// Resolver without the plural-normalized rank.
    #[must_use]
    pub const fn without_pluralizer() -> Self {
        Self { pluralizer: None }
    }

    #[must_use]
    pub const fn pluralizes(&self) -> bool {
        self.pluralizer.is_some()
    }

    /// Resolve `name` against `candidates`, reading each candidate's name
    /// through `name_of`.
    pub fn best_match<'a, T, I, F>(&self, candidates: I, name_of: F, name: &str) -> NameMatch<&'a T>
    where
        T: ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> &str,
    {
        let wanted = Key::new(name, self.pluralizer);
        let mut best: Option<MatchRank> = None;
        let mut hits: Vec<&'a T> = Vec::new();

        for candidate in candidates {
            let Some(rank) = wanted.rank(name_of(candidate), self.pluralizer) else {
                continue;
            };

            match best {
                Some(current) if rank > current => {}
                Some(current) if rank == current => hits.push(candidate),
                _ => {
                    best = Some(rank);
                    hits.clear();
                    hits.push(candidate);
                }
            }
        }

        match (best, hits.len()) {
            (Some(rank), 1) => NameMatch::Found {
                item: hits[0],
                rank,
            },
            (Some(rank), _) => NameMatch::Ambiguous {
                rank,
                candidates: hits,
            },
            (None, _) => NameMatch::NotFound,
        }
    }

    /// Convenience form of [`Self::best_match`] over plain names.
    pub fn best_name<'a, I>(&self, names: I, name: &str) -> NameMatch<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.best_match(names, |n| n, name)
    }
}

impl Default for NameResolver<'_> {
    fn default() -> Self {
        Self::without_pluralizer()
    }
}

impl fmt::Debug for NameResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameResolver")
            .field("pluralizes", &self.pluralizes())
            .finish()
    }
}

// Precomputed normal forms of the requested name.
struct Key<'n> {
    raw: &'n str,
    flat: String,
    singular: Option<String>,
}

impl<'n> Key<'n> {
    fn new(raw: &'n str, pluralizer: Option<&dyn Pluralizer>) -> Self {
        let flat = homogenize(raw);
        let singular = pluralizer.map(|p| p.singularize(&flat));

        Self {
            raw,
            flat,
            singular,
        }
    }

    fn rank(&self, candidate: &str, pluralizer: Option<&dyn Pluralizer>) -> Option<MatchRank> {
        if candidate == self.raw {
            return Some(MatchRank::Exact);
        }

        let flat = homogenize(candidate);
        if flat == self.flat {
            return Some(MatchRank::CaseInsensitive);
        }

        match (pluralizer, &self.singular) {
            (Some(p), Some(singular)) if p.singularize(&flat) == *singular => {
                Some(MatchRank::PluralNormalized)
            }
            _ => None,
        }
    }
}

///
/// TESTS
///
