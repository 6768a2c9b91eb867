///
/// Pluralizer
///
/// Singular/plural normalization used by fuzzy name resolution.
/// Implementations receive homogenized (lowercase, separator-free) words.
///

pub trait Pluralizer: Send + Sync {
    fn singularize(&self, word: &str) -> String;

    fn pluralize(&self, word: &str) -> String;
}

///
/// EnglishPluralizer
///
/// Rule-based English inflection covering the irregular and suffix forms
/// that show up in entity and property names.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct EnglishPluralizer;

/// Shared default instance.
pub static ENGLISH_PLURALIZER: EnglishPluralizer = EnglishPluralizer;

// (singular, plural)
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

const UNCOUNTABLE: &[&str] = &[
    "deer",
    "equipment",
    "fish",
    "information",
    "news",
    "series",
    "sheep",
    "species",
];

type PickForm = fn(&(&'static str, &'static str)) -> &'static str;

const SIBILANT_SUFFIXES: &[&str] = &["ch", "sh", "ss", "x", "z"];

impl EnglishPluralizer {
    // Irregular forms also apply as suffixes ("salesperson" -> "salespeople").
    fn irregular(word: &str, from: PickForm, to: PickForm) -> Option<String> {
        IRREGULAR.iter().find_map(|pair| {
            word.strip_suffix(from(pair))
                .map(|stem| format!("{stem}{}", to(pair)))
        })
    }

    fn is_uncountable(word: &str) -> bool {
        UNCOUNTABLE.iter().any(|w| word.ends_with(w))
    }
}

impl Pluralizer for EnglishPluralizer {
    fn singularize(&self, word: &str) -> String {
        if word.is_empty() || Self::is_uncountable(word) {
            return word.to_string();
        }
        if let Some(singular) = Self::irregular(word, |p| p.1, |p| p.0) {
            return singular;
        }
        if let Some(stem) = word.strip_suffix("ies")
            && !stem.is_empty()
        {
            return format!("{stem}y");
        }
        for suffix in SIBILANT_SUFFIXES {
            if let Some(stem) = word.strip_suffix(&format!("{suffix}es")) {
                return format!("{stem}{suffix}");
            }
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }

        word.strip_suffix('s').unwrap_or(word).to_string()
    }

    fn pluralize(&self, word: &str) -> String {
        if word.is_empty() || Self::is_uncountable(word) {
            return word.to_string();
        }
        if let Some(plural) = Self::irregular(word, |p| p.0, |p| p.1) {
            return plural;
        }
        if let Some(stem) = word.strip_suffix('y')
            && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
        {
            return format!("{stem}ies");
        }
        if SIBILANT_SUFFIXES.iter().any(|suffix| word.ends_with(suffix)) {
            return format!("{word}es");
        }

        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singularizes_common_suffixes() {
        let p = EnglishPluralizer;

        assert_eq!(p.singularize("orders"), "order");
        assert_eq!(p.singularize("categories"), "category");
        assert_eq!(p.singularize("addresses"), "address");
        assert_eq!(p.singularize("boxes"), "box");
        assert_eq!(p.singularize("matches"), "match");
        assert_eq!(p.singularize("address"), "address");
        assert_eq!(p.singularize("status"), "status");
    }

    #[test]
    fn handles_irregular_and_uncountable_words() {
        let p = EnglishPluralizer;

        assert_eq!(p.singularize("people"), "person");
        assert_eq!(p.singularize("salespeople"), "salesperson");
        assert_eq!(p.pluralize("child"), "children");
        assert_eq!(p.singularize("series"), "series");
        assert_eq!(p.pluralize("sheep"), "sheep");
    }

    #[test]
    fn pluralizes_common_suffixes() {
        let p = EnglishPluralizer;

        assert_eq!(p.pluralize("order"), "orders");
        assert_eq!(p.pluralize("category"), "categories");
        assert_eq!(p.pluralize("day"), "days");
        assert_eq!(p.pluralize("box"), "boxes");
    }
}
