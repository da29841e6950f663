//! Ranking dataset loading and read-only access
//!
//! The dataset is loaded once at startup from CSV files and never mutated.
//! Two tables exist: the per-specialty ranking and a general table used when
//! a question names no specialty (the overall honor roll).

use crate::config::DatasetConfig;
use crate::errors::{AppError, Result};
use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Public or private sector of an institution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstitutionType {
    Public,
    Private,
}

impl InstitutionType {
    /// The other sector, used by the opposite-type fallback
    pub fn opposite(self) -> Self {
        match self {
            Self::Public => Self::Private,
            Self::Private => Self::Public,
        }
    }

    /// French label as it appears in answers
    pub fn label(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "privé",
        }
    }

    /// French plural noun phrase, e.g. "établissements publics"
    pub fn plural_label(self) -> &'static str {
        match self {
            Self::Public => "publics",
            Self::Private => "privés",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match crate::text::normalize(value).as_str() {
            "public" | "publique" => Some(Self::Public),
            "prive" | "privee" | "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for InstitutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the ranking table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub institution: String,
    pub category: InstitutionType,
    pub specialty: String,
    /// Score out of 20, higher is better
    pub score: f64,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl RankingRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// CSV row shape shared by both tables
#[derive(Debug, Deserialize)]
struct CsvRow {
    institution: String,
    category: String,
    #[serde(default)]
    specialty: String,
    score: f64,
    city: String,
    latitude: f64,
    longitude: f64,
}

impl CsvRow {
    fn into_record(self, line: usize) -> Result<RankingRecord> {
        let category = InstitutionType::parse(&self.category).ok_or_else(|| {
            AppError::Dataset {
                message: format!(
                    "line {}: unknown category '{}'",
                    line, self.category
                ),
            }
        })?;
        if !(0.0..=20.0).contains(&self.score) {
            return Err(AppError::Dataset {
                message: format!("line {}: score {} out of range", line, self.score),
            });
        }
        Ok(RankingRecord {
            institution: self.institution,
            category,
            specialty: self.specialty,
            score: self.score,
            city: self.city,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

/// In-memory, immutable view over the ranking tables
pub struct RankingStore {
    records: Vec<RankingRecord>,
    general: Vec<RankingRecord>,
}

impl RankingStore {
    /// Load both tables from the configured CSV files
    pub fn load(config: &DatasetConfig) -> Result<Self> {
        let records = read_table(&config.ranking_path)?;
        let general = read_table(&config.general_ranking_path)?;
        if records.is_empty() {
            return Err(AppError::Dataset {
                message: format!("ranking table {} is empty", config.ranking_path),
            });
        }
        tracing::info!(
            specialty_rows = records.len(),
            general_rows = general.len(),
            "ranking dataset loaded"
        );
        Ok(Self { records, general })
    }

    /// Build a store from in-memory rows
    pub fn from_records(records: Vec<RankingRecord>, general: Vec<RankingRecord>) -> Self {
        Self { records, general }
    }

    /// All per-specialty rows
    pub fn records(&self) -> &[RankingRecord] {
        &self.records
    }

    /// The general table, used when no specialty was resolved
    pub fn general(&self) -> &[RankingRecord] {
        &self.general
    }

    /// Rows for one specialty, in original table order
    pub fn for_specialty(&self, specialty: &str) -> Vec<&RankingRecord> {
        let wanted = crate::text::normalize(specialty);
        self.records
            .iter()
            .filter(|r| crate::text::normalize(&r.specialty) == wanted)
            .collect()
    }

    /// Distinct specialty names present in the dataset
    pub fn specialties(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.specialty.as_str()).collect()
    }

    /// Distinct institution names with their sector, deduplicated
    ///
    /// Feeds the canonical list the institution-name validator matches
    /// against.
    pub fn institutions(&self) -> Vec<(&str, InstitutionType)> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for record in self.records.iter().chain(self.general.iter()) {
            if seen.insert(record.institution.as_str()) {
                out.push((record.institution.as_str(), record.category));
            }
        }
        out
    }
}

fn read_table(path: &str) -> Result<Vec<RankingRecord>> {
    let path = Path::new(path);
    let mut reader = csv::Reader::from_path(path).map_err(|e| AppError::Dataset {
        message: format!("failed to open {}: {}", path.display(), e),
    })?;

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let row = row.map_err(|e| AppError::Dataset {
            message: format!("{} line {}: {}", path.display(), line, e),
        })?;
        records.push(row.into_record(line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(institution: &str, category: InstitutionType, specialty: &str, score: f64) -> RankingRecord {
        RankingRecord {
            institution: institution.to_string(),
            category,
            specialty: specialty.to_string(),
            score,
            city: "Lyon".to_string(),
            latitude: 45.76,
            longitude: 4.83,
        }
    }

    #[test]
    fn test_institution_type_parse() {
        assert_eq!(InstitutionType::parse("Public"), Some(InstitutionType::Public));
        assert_eq!(InstitutionType::parse("Privé"), Some(InstitutionType::Private));
        assert_eq!(InstitutionType::parse("prive"), Some(InstitutionType::Private));
        assert_eq!(InstitutionType::parse("autre"), None);
    }

    #[test]
    fn test_for_specialty_is_accent_insensitive() {
        let store = RankingStore::from_records(
            vec![
                record("CHU de Lyon", InstitutionType::Public, "Chirurgie de l'obésité", 18.0),
                record("Clinique du Parc", InstitutionType::Private, "Cardiologie", 16.0),
            ],
            vec![],
        );
        assert_eq!(store.for_specialty("chirurgie de l obesite").len(), 1);
        assert_eq!(store.for_specialty("Cardiologie").len(), 1);
        assert!(store.for_specialty("Urologie").is_empty());
    }

    #[test]
    fn test_institutions_deduplicates_across_tables() {
        let rows = vec![
            record("CHU de Lyon", InstitutionType::Public, "Cardiologie", 18.0),
            record("CHU de Lyon", InstitutionType::Public, "Urologie", 17.0),
        ];
        let general = vec![record("CHU de Lyon", InstitutionType::Public, "", 18.5)];
        let store = RankingStore::from_records(rows, general);
        assert_eq!(store.institutions().len(), 1);
    }
}
