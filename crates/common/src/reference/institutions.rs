//! Canonical institution registry
//!
//! Built from the ranking dataset at startup. Institution names are stored
//! under an expanded, normalized form so that a user writing "CHU de Lyon"
//! and a table row saying "Centre Hospitalier Universitaire de Lyon" meet in
//! the middle.

use crate::dataset::{InstitutionType, RankingStore};
use crate::text;
use std::collections::HashMap;

/// Abbreviations expanded before matching, longest prefix first
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("chru", "centre hospitalier régional universitaire"),
    ("chu", "centre hospitalier universitaire"),
    ("chs", "centre hospitalier spécialisé"),
    ("chi", "centre hospitalier intercommunal"),
    ("ch", "centre hospitalier"),
];

/// A canonical institution with its sector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalInstitution {
    pub name: String,
    pub category: InstitutionType,
}

/// Canonical institution names and their sectors
pub struct InstitutionRegistry {
    /// Expanded normalized form paired with the canonical entry
    entries: Vec<(String, CanonicalInstitution)>,
    by_normalized: HashMap<String, usize>,
}

impl InstitutionRegistry {
    /// Build the registry from every institution present in the dataset
    pub fn from_store(store: &RankingStore) -> Self {
        Self::from_entries(
            store
                .institutions()
                .into_iter()
                .map(|(name, category)| (name.to_string(), category)),
        )
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, InstitutionType)>,
    {
        let mut expanded = Vec::new();
        let mut by_normalized = HashMap::new();
        for (name, category) in entries {
            let key = expand_abbreviations(&name);
            by_normalized.insert(key.clone(), expanded.len());
            expanded.push((key, CanonicalInstitution { name, category }));
        }
        Self {
            entries: expanded,
            by_normalized,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Fuzzy-match a detected name against the canonical list
    ///
    /// Abbreviations in the input are expanded first, then the match runs at
    /// the shared threshold. Returns the canonical entry or nothing.
    pub fn resolve(&self, detected_name: &str) -> Option<&CanonicalInstitution> {
        let expanded = expand_abbreviations(detected_name);
        if let Some(&index) = self.by_normalized.get(&expanded) {
            return Some(&self.entries[index].1);
        }
        text::fuzzy_match(&expanded, self.entries.iter().map(|(key, _)| key.as_str()))
            .and_then(|key| self.by_normalized.get(key))
            .map(|&index| &self.entries[index].1)
    }
}

/// Expand hospital abbreviations and normalize for matching
fn expand_abbreviations(name: &str) -> String {
    let normalized = text::normalize(name);
    let expanded: Vec<&str> = normalized
        .split_whitespace()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| *full)
                .unwrap_or(word)
        })
        .collect();
    text::normalize(&expanded.join(" "))
}
