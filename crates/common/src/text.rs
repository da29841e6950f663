//! Text normalization and fuzzy matching helpers
//!
//! All validators share one normalization scheme (lowercase, accents folded,
//! apostrophes and hyphens unified) and one similarity cutoff so that the
//! commune, specialty, and institution matchers behave consistently.

use crate::FUZZY_MATCH_THRESHOLD;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize text for matching: lowercase, strip accents, fold punctuation
pub fn normalize(input: &str) -> String {
    let stripped: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped
        .to_lowercase()
        .replace(['\'', '’'], " ")
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip accents only, preserving case; apostrophes become hyphens
///
/// Used for ranking-page URL slugs.
pub fn strip_accents(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .replace(['\'', '’'], "-")
}

/// Normalized similarity between two strings in [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize(a), &normalize(b))
}

/// Best fuzzy match for `value` among `candidates` at the shared threshold
///
/// Returns the canonical candidate, not the input spelling.
pub fn fuzzy_match<'a, I>(value: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = similarity(value, candidate);
        if score >= FUZZY_MATCH_THRESHOLD
            && best.map_or(true, |(_, top)| score > top)
        {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// True when `needle` occurs in `haystack` after normalization, on word
/// boundaries for single words and as a substring for multi-word phrases
pub fn contains_term(haystack: &str, needle: &str) -> bool {
    let haystack = normalize(haystack);
    let needle = normalize(needle);
    if needle.is_empty() {
        return false;
    }
    if needle.contains(' ') {
        return haystack.contains(&needle);
    }
    haystack.split_whitespace().any(|word| word == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_accents_and_case() {
        assert_eq!(normalize("Hôpital Necker"), "hopital necker");
        assert_eq!(normalize("L'Hôtel-Dieu"), "l hotel dieu");
    }

    #[test]
    fn test_strip_accents_keeps_case() {
        assert_eq!(strip_accents("Chirurgie de l'épaule"), "Chirurgie de l-epaule");
    }

    #[test]
    fn test_fuzzy_match_tolerates_typos() {
        let communes = ["lyon", "paris", "marseille"];
        assert_eq!(fuzzy_match("Marseile", communes), Some("marseille"));
        assert_eq!(fuzzy_match("Lyno", communes), None);
        assert_eq!(fuzzy_match("LYON", communes), Some("lyon"));
    }

    #[test]
    fn test_contains_term_word_boundaries() {
        assert!(contains_term("Quel est le meilleur hôpital", "hôpital"));
        assert!(!contains_term("cardiologie", "cardio"));
        assert!(contains_term("prothèse de hanche à Lyon", "prothèse de hanche"));
    }
}
