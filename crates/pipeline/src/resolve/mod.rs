//! Query resolution against the ranking dataset
//!
//! Combines validated parameters with the read-only tables: disambiguates
//! multi-candidate specialties, filters by specialty and sector with the
//! opposite-type fallback, reports ranks for named institutions, and runs
//! either the score or the radius-expansion lookup.

pub mod format;
pub mod links;
pub mod lookup;

use crate::analysis::{ResolvedQueryParameters, SpecialtyMatch};
use crate::messages;
use lookup::{RadiusLookup, RecordLookup, ScoreLookup, Selection};
use palmares_common::config::SearchConfig;
use palmares_common::dataset::{InstitutionType, RankingRecord, RankingStore};
use palmares_common::errors::AppError;
use palmares_common::geo::Geocoder;
use palmares_common::metrics::record_geocoding;
use palmares_common::{text, Result};
use std::sync::Arc;

/// What one resolution cycle produced
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub records: Vec<RankingRecord>,
    pub radius_used: Option<f64>,
    pub fell_back_to_opposite_type: bool,
}

/// Result of resolving validated parameters
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The caller must re-invoke with one candidate chosen
    Disambiguation {
        prompt: String,
        candidates: Vec<String>,
    },
    /// Final formatted answer
    Answer {
        text: String,
        links: Vec<String>,
        outcome: SearchOutcome,
    },
}

pub struct ResolutionEngine {
    store: Arc<RankingStore>,
    geocoder: Arc<dyn Geocoder>,
    search: SearchConfig,
}

impl ResolutionEngine {
    pub fn new(store: Arc<RankingStore>, geocoder: Arc<dyn Geocoder>, search: SearchConfig) -> Self {
        Self {
            store,
            geocoder,
            search,
        }
    }

    pub async fn resolve(&self, params: &ResolvedQueryParameters) -> Result<Resolution> {
        if let SpecialtyMatch::MultipleCandidates(candidates) = &params.specialty {
            return Ok(Resolution::Disambiguation {
                prompt: messages::MULTIPLE_SPECIALTIES.to_string(),
                candidates: candidates.clone(),
            });
        }

        let specialty = params.specialty.single();
        let table: Vec<&RankingRecord> = match specialty {
            Some(name) => self.store.for_specialty(name),
            None => self.store.general().iter().collect(),
        };

        if !params.institution_names.is_empty() {
            return Ok(self.named_institution_answer(params, specialty, &table));
        }

        // Sector filter with the opposite-type fallback
        let mut fell_back = false;
        let mut notice = None;
        let candidates: Vec<&RankingRecord> = match params.institution_type {
            Some(wanted) => {
                let of_type: Vec<&RankingRecord> = table
                    .iter()
                    .copied()
                    .filter(|r| r.category == wanted)
                    .collect();
                if of_type.is_empty() {
                    let opposite: Vec<&RankingRecord> = table
                        .iter()
                        .copied()
                        .filter(|r| r.category == wanted.opposite())
                        .collect();
                    if opposite.is_empty() {
                        return Ok(no_results_answer(specialty));
                    }
                    tracing::info!(requested = %wanted, "opposite-type fallback engaged");
                    fell_back = true;
                    notice = Some(match wanted {
                        InstitutionType::Public => messages::NO_PUBLIC_FALLBACK,
                        InstitutionType::Private => messages::NO_PRIVATE_FALLBACK,
                    });
                    opposite
                } else {
                    of_type
                }
            }
            None => table,
        };

        if candidates.is_empty() {
            return Ok(no_results_answer(specialty));
        }

        let selection = match &params.location {
            Some(scope) => {
                let origin = self.geocode(scope.place_name()).await?;
                RadiusLookup {
                    origin,
                    ladder: self.search.radius_ladder_km.clone(),
                }
                .select(&candidates, params.result_count)
            }
            None => ScoreLookup.select(&candidates, params.result_count),
        };

        if selection.records.is_empty() {
            return Ok(Resolution::Answer {
                text: messages::NO_RESULTS_IN_RADIUS.to_string(),
                links: links::build(specialty, &[]),
                outcome: SearchOutcome {
                    records: Vec::new(),
                    radius_used: selection.radius_used,
                    fell_back_to_opposite_type: fell_back,
                },
            });
        }

        Ok(self.format_answer(params, specialty, notice, fell_back, selection))
    }

    fn format_answer(
        &self,
        params: &ResolvedQueryParameters,
        specialty: Option<&str>,
        notice: Option<&str>,
        fell_back: bool,
        selection: Selection,
    ) -> Resolution {
        let mut text = String::new();
        if let Some(notice) = notice {
            text.push_str(notice);
            text.push('\n');
        }
        text.push_str(&format::header(
            selection.records.len(),
            params.result_count,
            specialty,
            params.location.as_ref(),
            selection.radius_used,
        ));
        text.push('\n');
        text.push_str(&format::category_blocks(&selection.records, params.result_count));

        // The outcome carries exactly what the listing shows, up to
        // result_count per category
        let mut shown: Vec<&lookup::SelectedRecord> = Vec::new();
        for category in [InstitutionType::Public, InstitutionType::Private] {
            shown.extend(
                selection
                    .records
                    .iter()
                    .filter(|s| s.record.category == category)
                    .take(params.result_count),
            );
        }
        let categories = present_categories(shown.iter().map(|s| s.record.category));
        let links = links::build(specialty, &categories);

        let records = shown.into_iter().map(|s| s.record.clone()).collect::<Vec<_>>();
        Resolution::Answer {
            text,
            links,
            outcome: SearchOutcome {
                records,
                radius_used: selection.radius_used,
                fell_back_to_opposite_type: fell_back,
            },
        }
    }

    /// Rank report for named institutions, no top-K selection
    ///
    /// Positions are taken in the specialty's full sorted table, descending
    /// score with ties in table order.
    fn named_institution_answer(
        &self,
        params: &ResolvedQueryParameters,
        specialty: Option<&str>,
        table: &[&RankingRecord],
    ) -> Resolution {
        let sorted = ScoreLookup.select(table, table.len());

        let mut lines = Vec::new();
        let mut categories = Vec::new();
        for named in &params.institution_names {
            let wanted = text::normalize(&named.name);
            let ranked = sorted
                .records
                .iter()
                .position(|s| text::normalize(&s.record.institution) == wanted)
                .map(|index| (index + 1, sorted.records[index].record.score));
            lines.push(format::named_rank(&named.name, ranked, specialty));
            categories.push(named.category);
        }

        let categories = present_categories(categories.into_iter());
        Resolution::Answer {
            text: lines.join("\n"),
            links: links::build(specialty, &categories),
            outcome: SearchOutcome::default(),
        }
    }

    async fn geocode(&self, place: &str) -> Result<palmares_common::geo::Coordinates> {
        let resolved = self.geocoder.resolve(place).await;
        record_geocoding(matches!(resolved, Ok(Some(_))));
        match resolved? {
            Some(coordinates) => Ok(coordinates),
            // No coordinates means no distance-based results at all
            None => Err(AppError::Geocoding {
                message: format!("no coordinates found for {}", place),
            }),
        }
    }
}

fn no_results_answer(specialty: Option<&str>) -> Resolution {
    Resolution::Answer {
        text: messages::NO_RESULTS.to_string(),
        links: links::build(specialty, &[]),
        outcome: SearchOutcome::default(),
    }
}

/// Distinct categories in public-then-private order
fn present_categories<I: Iterator<Item = InstitutionType>>(categories: I) -> Vec<InstitutionType> {
    let mut present = Vec::new();
    for category in categories {
        if !present.contains(&category) {
            present.push(category);
        }
    }
    present.sort_by_key(|c| match c {
        InstitutionType::Public => 0,
        InstitutionType::Private => 1,
    });
    present
}
