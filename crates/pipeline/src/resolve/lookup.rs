//! Candidate selection strategies
//!
//! Two strategies share one interface: a straight score ordering when no
//! geographic scope was resolved, and a radius-expansion search around a
//! geocoded origin otherwise. The engine picks one at a single decision
//! point.

use palmares_common::dataset::RankingRecord;
use palmares_common::geo::{distance_km, Coordinates};

/// One selected record with its distance to the origin, when distances apply
#[derive(Debug, Clone)]
pub struct SelectedRecord {
    pub record: RankingRecord,
    pub distance_km: Option<f64>,
}

/// Ordered result of one lookup
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Records sorted by descending score, ties kept in table order
    pub records: Vec<SelectedRecord>,
    /// Radius that produced the records, when the radius strategy ran
    pub radius_used: Option<f64>,
}

pub trait RecordLookup {
    /// Select candidates, ordered best-first
    fn select(&self, candidates: &[&RankingRecord], wanted: usize) -> Selection;
}

/// Descending-score selection over the whole candidate set
pub struct ScoreLookup;

impl RecordLookup for ScoreLookup {
    fn select(&self, candidates: &[&RankingRecord], _wanted: usize) -> Selection {
        Selection {
            records: sort_by_score(candidates.iter().map(|r| SelectedRecord {
                record: (*r).clone(),
                distance_km: None,
            })),
            radius_used: None,
        }
    }
}

/// Radius-expansion selection around a geocoded origin
///
/// Radii are tried in ascending order; the search stops at the first rung
/// where the combined candidate count meets `wanted`, otherwise it returns
/// whatever the largest rung found.
pub struct RadiusLookup {
    pub origin: Coordinates,
    pub ladder: Vec<f64>,
}

impl RecordLookup for RadiusLookup {
    fn select(&self, candidates: &[&RankingRecord], wanted: usize) -> Selection {
        let with_distance: Vec<(&RankingRecord, f64)> = candidates
            .iter()
            .map(|r| (*r, distance_km(self.origin, r.coordinates())))
            .collect();

        let mut selection = Selection::default();
        for &radius in &self.ladder {
            let within: Vec<&(&RankingRecord, f64)> = with_distance
                .iter()
                .filter(|(_, d)| *d <= radius)
                .collect();
            selection = Selection {
                records: sort_by_score(within.iter().map(|(r, d)| SelectedRecord {
                    record: (*r).clone(),
                    distance_km: Some(*d),
                })),
                radius_used: Some(radius),
            };
            if selection.records.len() >= wanted {
                break;
            }
        }
        selection
    }
}

fn sort_by_score<I: Iterator<Item = SelectedRecord>>(records: I) -> Vec<SelectedRecord> {
    let mut out: Vec<SelectedRecord> = records.collect();
    // Stable sort keeps the table order for equal scores
    out.sort_by(|a, b| {
        b.record
            .score
            .partial_cmp(&a.record.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}
