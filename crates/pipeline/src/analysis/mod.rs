//! Query analysis
//!
//! Five detector/validator pairs run strictly in sequence (specialty,
//! location, institution names, institution type, result count) and their
//! outputs are aggregated into one [`ResolvedQueryParameters`] together with
//! the cost ledger. Recoverable validation failures degrade the entity to
//! "absent"; aborting ones halt the whole turn.

pub mod institution_names;
pub mod institution_type;
pub mod location;
pub mod result_count;
pub mod specialty;

use crate::Turn;
use palmares_common::config::SearchConfig;
use palmares_common::dataset::InstitutionType;
use palmares_common::llm::{ChatModel, Completion};
use palmares_common::metrics::record_llm_call;
use palmares_common::reference::{Gazetteer, InstitutionRegistry, SpecialtyTaxonomy};
use palmares_common::{CallUsage, CostLedger, Result, ValidationFailure};
use std::sync::Arc;

/// How a detection produced its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    /// Deterministic rule, no external call
    Rule,
    /// One or more chat-model calls
    CapabilityCall,
}

/// Output of one detector/validator pair
///
/// Usage is zero exactly when the method did not invoke the capability.
#[derive(Debug, Clone)]
pub struct DetectionResult<T> {
    pub value: T,
    pub method: DetectionMethod,
    pub usage: CallUsage,
}

impl<T> DetectionResult<T> {
    pub fn rule(value: T) -> Self {
        Self {
            value,
            method: DetectionMethod::Rule,
            usage: CallUsage::ZERO,
        }
    }

    pub fn from_call(value: T, usage: CallUsage) -> Self {
        Self {
            value,
            method: DetectionMethod::CapabilityCall,
            usage,
        }
    }
}

/// Specialty resolution outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialtyMatch {
    /// No specialty mentioned; the general table applies
    Absent,
    /// Exactly one canonical specialty
    Single(String),
    /// Several candidates; the caller must pick one
    MultipleCandidates(Vec<String>),
}

impl SpecialtyMatch {
    pub fn is_absent(&self) -> bool {
        matches!(self, SpecialtyMatch::Absent)
    }

    /// The single resolved name, if any
    pub fn single(&self) -> Option<&str> {
        match self {
            SpecialtyMatch::Single(name) => Some(name),
            _ => None,
        }
    }
}

/// The one geographic constraint of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationScope {
    Region(String),
    Department(String),
    Commune(String),
    PostalCode(String),
}

impl LocationScope {
    /// The place name to hand to the geocoder
    pub fn place_name(&self) -> &str {
        match self {
            LocationScope::Region(v)
            | LocationScope::Department(v)
            | LocationScope::Commune(v)
            | LocationScope::PostalCode(v) => v,
        }
    }
}

/// What the user wants done with named institutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstitutionIntent {
    Single,
    Multi,
    Compare,
    #[default]
    None,
}

impl InstitutionIntent {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "single" => Some(Self::Single),
            "multi" => Some(Self::Multi),
            "compare" => Some(Self::Compare),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// An institution the user named, matched to its canonical entry
#[derive(Debug, Clone, PartialEq)]
pub struct NamedInstitution {
    pub name: String,
    pub category: InstitutionType,
}

/// An aborting validation failure and the usage already paid for it
///
/// Detection calls made before the abort are real spend; the ledger keeps
/// them so the cycle can still be accounted for.
#[derive(Debug, Clone)]
pub struct HaltedAnalysis {
    pub failure: ValidationFailure,
    pub ledger: CostLedger,
}

/// Validated structured search parameters for one turn
#[derive(Debug, Clone)]
pub struct ResolvedQueryParameters {
    pub specialty: SpecialtyMatch,
    pub institution_type: Option<InstitutionType>,
    pub location: Option<LocationScope>,
    pub institution_names: Vec<NamedInstitution>,
    pub intent: InstitutionIntent,
    pub result_count: usize,
    pub ledger: CostLedger,
}

/// Invoke the model and record call metrics under a purpose label
pub(crate) async fn invoke_tracked(
    model: &dyn ChatModel,
    purpose: &str,
    prompt: &str,
) -> Result<Completion> {
    match model.invoke(prompt).await {
        Ok(completion) => {
            record_llm_call(purpose, completion.usage.total_tokens, true);
            Ok(completion)
        }
        Err(e) => {
            record_llm_call(purpose, 0, false);
            Err(e)
        }
    }
}

/// Orchestrates the five detector/validator pairs for one turn
pub struct QueryAnalyst {
    model: Arc<dyn ChatModel>,
    taxonomy: SpecialtyTaxonomy,
    /// Specialty names present in the ranking dataset
    specialties: Arc<Vec<String>>,
    gazetteer: Arc<Gazetteer>,
    registry: Arc<InstitutionRegistry>,
    search: SearchConfig,
}

impl QueryAnalyst {
    pub fn new(
        model: Arc<dyn ChatModel>,
        specialties: Arc<Vec<String>>,
        gazetteer: Arc<Gazetteer>,
        registry: Arc<InstitutionRegistry>,
        search: SearchConfig,
    ) -> Self {
        Self {
            model,
            taxonomy: SpecialtyTaxonomy::new(),
            specialties,
            gazetteer,
            registry,
            search,
        }
    }

    /// Run all detections for one turn and aggregate the results
    ///
    /// The inner `Result` carries aborting validation failures together with
    /// the ledger spent up to the abort; fatal capability errors travel on
    /// the outer `Result`.
    pub async fn resolve(
        &self,
        text: &str,
        history: &[Turn],
    ) -> Result<std::result::Result<ResolvedQueryParameters, HaltedAnalysis>> {
        let mut ledger = CostLedger::default();

        let detected = specialty::detect_and_validate(
            self.model.as_ref(),
            &self.taxonomy,
            &self.specialties,
            text,
        )
        .await?;
        ledger.specialty = detected.usage;
        let specialty = match detected.value {
            Ok(matched) => matched,
            Err(failure) => {
                tracing::warn!(%failure, "specialty validation failed, treating as absent");
                SpecialtyMatch::Absent
            }
        };

        let detected =
            location::detect_and_validate(self.model.as_ref(), &self.gazetteer, text, history)
                .await?;
        ledger.location = detected.usage;
        let location = match detected.value {
            Ok(scope) => scope,
            Err(failure) if failure.aborts_cycle() => {
                return Ok(Err(HaltedAnalysis { failure, ledger }));
            }
            Err(failure) => {
                tracing::warn!(%failure, "location validation failed, treating as absent");
                None
            }
        };

        let detected =
            institution_names::detect_and_validate(self.model.as_ref(), &self.registry, text)
                .await?;
        ledger.institution_names = detected.usage;
        let (institution_names, intent) = match detected.value {
            Ok(outcome) => outcome,
            Err(failure) if failure.aborts_cycle() => {
                return Ok(Err(HaltedAnalysis { failure, ledger }));
            }
            Err(failure) => {
                tracing::warn!(%failure, "institution names rejected, treating as absent");
                (Vec::new(), InstitutionIntent::None)
            }
        };

        let detected = institution_type::detect(self.model.as_ref(), text).await?;
        ledger.institution_type = detected.usage;
        let institution_type = detected.value;

        let detected = result_count::detect(self.model.as_ref(), &self.search, text).await?;
        ledger.result_count = detected.usage;
        let result_count = if institution_names.is_empty() {
            detected.value.unwrap_or(self.search.default_result_count)
        } else {
            // Named-institution queries are exhaustive, not top-K
            institution_names.len()
        };

        tracing::info!(
            specialty = ?specialty,
            location = ?location,
            institution_type = ?institution_type,
            named = institution_names.len(),
            result_count,
            total_cost = ledger.total_cost(),
            total_tokens = ledger.total_tokens(),
            "query analysis complete"
        );

        Ok(Ok(ResolvedQueryParameters {
            specialty,
            institution_type,
            location,
            institution_names,
            intent,
            result_count,
            ledger,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_common::llm::ScriptedModel;
    use palmares_common::ValidationFailure;

    fn search_config() -> SearchConfig {
        SearchConfig {
            radius_ladder_km: vec![5.0, 10.0, 50.0, 100.0],
            default_result_count: 3,
            min_result_count: 1,
            max_result_count: 50,
        }
    }

    fn analyst(model: ScriptedModel) -> QueryAnalyst {
        let registry = InstitutionRegistry::from_entries([
            (
                "Centre Hospitalier Universitaire de Lyon".to_string(),
                InstitutionType::Public,
            ),
            ("Clinique du Parc".to_string(), InstitutionType::Private),
        ]);
        QueryAnalyst::new(
            Arc::new(model),
            Arc::new(vec!["Cardiologie".to_string(), "Cataracte".to_string()]),
            Arc::new(Gazetteer::from_parts(["Lyon", "Paris", "Marseille"])),
            Arc::new(registry),
            search_config(),
        )
    }

    #[tokio::test]
    async fn test_resolve_simple_question() {
        // Specialty is found by rule, so the scripted answers cover location
        // status, location extraction, institutions, type and count.
        let model = ScriptedModel::with_queue([
            "3",
            r#"{"location": [{"type": "city_commune", "value": "Lyon"}]}"#,
            r#"{"institutions": [], "intent": "none"}"#,
            "public",
            "aucune correspondance",
        ]);
        let analyst = analyst(model);
        let resolved = analyst
            .resolve("Quel est le meilleur hôpital public pour cardiologie à Lyon ?", &[])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            resolved.specialty,
            SpecialtyMatch::Single("Cardiologie".to_string())
        );
        assert_eq!(resolved.location, Some(LocationScope::Commune("Lyon".to_string())));
        assert_eq!(resolved.institution_type, Some(InstitutionType::Public));
        assert_eq!(resolved.result_count, 3);
        // Specialty came from a rule, so only four calls were paid for
        assert!(resolved.ledger.specialty.is_zero());
        assert!(!resolved.ledger.location.is_zero());
    }

    #[tokio::test]
    async fn test_ledger_totals_sum_named_fields() {
        let model = ScriptedModel::with_queue([
            "0",
            r#"{"institutions": [], "intent": "none"}"#,
            "aucune correspondance",
            "5",
        ]);
        let analyst = analyst(model);
        let resolved = analyst
            .resolve("Les 5 meilleurs hôpitaux pour la cataracte", &[])
            .await
            .unwrap()
            .unwrap();

        let expected_cost = resolved.ledger.specialty.cost
            + resolved.ledger.location.cost
            + resolved.ledger.institution_names.cost
            + resolved.ledger.institution_type.cost
            + resolved.ledger.result_count.cost;
        assert!((resolved.ledger.total_cost() - expected_cost).abs() < 1e-12);
        assert_eq!(resolved.result_count, 5);
    }

    #[tokio::test]
    async fn test_unrecognized_institution_aborts() {
        let model = ScriptedModel::with_queue([
            "0",
            r#"{"institutions": ["Hôpital Imaginaire"], "intent": "single"}"#,
        ]);
        let analyst = analyst(model);
        let halted = analyst
            .resolve("Quelle est la position de l'Hôpital Imaginaire pour la cataracte ?", &[])
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(
            halted.failure,
            ValidationFailure::UnrecognizedInstitution { .. }
        ));
        // The location and institution-names calls were already paid for
        assert!(halted.ledger.total_tokens() > 0);
        assert!(!halted.ledger.institution_names.is_zero());
    }

    #[tokio::test]
    async fn test_named_institutions_override_result_count() {
        let model = ScriptedModel::with_queue([
            "0",
            r#"{"institutions": ["CHU de Lyon", "Clinique du Parc"], "intent": "compare"}"#,
            "aucune correspondance",
            "aucune correspondance",
        ]);
        let analyst = analyst(model);
        let resolved = analyst
            .resolve("Comparez le CHU de Lyon et la Clinique du Parc pour la cataracte", &[])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.institution_names.len(), 2);
        assert_eq!(resolved.result_count, 2);
        assert_eq!(resolved.intent, InstitutionIntent::Compare);
    }

    #[tokio::test]
    async fn test_foreign_location_degrades_to_absent() {
        let model = ScriptedModel::with_queue([
            "1",
            r#"{"institutions": [], "intent": "none"}"#,
            "aucune correspondance",
            "aucune correspondance",
        ]);
        let analyst = analyst(model);
        let resolved = analyst
            .resolve("Le meilleur hôpital pour la cataracte à Genève ?", &[])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.location, None);
    }
}
