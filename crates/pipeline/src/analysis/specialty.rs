//! Specialty detection and validation
//!
//! A deterministic keyword pass runs first: dataset specialty names, then
//! taxonomy sub-specialties, then category vocabulary. Only when nothing
//! matches does the chat model get called, with the keyword mapping as
//! context. Either way the output is validated into a [`SpecialtyMatch`].

use super::{invoke_tracked, DetectionResult, SpecialtyMatch};
use crate::prompts;
use crate::Validated;
use palmares_common::llm::ChatModel;
use palmares_common::reference::SpecialtyTaxonomy;
use palmares_common::{text, Result, ValidationFailure};

pub async fn detect_and_validate(
    model: &dyn ChatModel,
    taxonomy: &SpecialtyTaxonomy,
    known_specialties: &[String],
    message: &str,
) -> Result<DetectionResult<Validated<SpecialtyMatch>>> {
    if let Some(matched) = detect_by_rule(taxonomy, known_specialties, message) {
        tracing::debug!(?matched, "specialty matched by rule");
        return Ok(DetectionResult::rule(Ok(matched)));
    }

    let prompt = prompts::specialty_detection(message, &keyword_context(taxonomy));
    let completion = invoke_tracked(model, "specialty", &prompt).await?;
    let validated = validate_output(taxonomy, known_specialties, &completion.content);
    Ok(DetectionResult::from_call(validated, completion.call_usage()))
}

/// Render the taxonomy as prompt context, one category per line
fn keyword_context(taxonomy: &SpecialtyTaxonomy) -> String {
    let mut lines = Vec::new();
    for category in taxonomy.categories() {
        let specialties = taxonomy.category_specialties(category).join(", ");
        let variations = taxonomy.category_variations(category);
        if variations.is_empty() {
            lines.push(format!("- {category} : {specialties}"));
        } else {
            lines.push(format!(
                "- {category} (mots-clés : {}) : {specialties}",
                variations.join(", ")
            ));
        }
    }
    lines.join("\n")
}

/// Deterministic keyword matching, no capability call
fn detect_by_rule(
    taxonomy: &SpecialtyTaxonomy,
    known_specialties: &[String],
    message: &str,
) -> Option<SpecialtyMatch> {
    // Cancer mentioned without a specific type offers all medical cancer
    // specialties as candidates
    if taxonomy.is_general_cancer_query(message) {
        return Some(candidates(
            taxonomy.cancer_specialties().into_iter().map(String::from),
        ));
    }

    let normalized = text::normalize(message);

    for name in known_specialties {
        let norm = text::normalize(name);
        if !norm.is_empty() && normalized.contains(&norm) {
            return Some(SpecialtyMatch::Single(name.clone()));
        }
    }

    // Multi-word sub-specialty names are specific enough to match inline
    for name in taxonomy.all_specialties() {
        let norm = text::normalize(name);
        if norm.contains(' ') && normalized.contains(&norm) {
            return Some(SpecialtyMatch::Single(name.to_string()));
        }
    }

    for category in taxonomy.categories() {
        if text::contains_term(&normalized, &text::normalize(category)) {
            return Some(candidates(
                taxonomy
                    .category_specialties(category)
                    .into_iter()
                    .map(String::from),
            ));
        }
    }

    taxonomy.category_for_variation(message).map(|category| {
        candidates(
            taxonomy
                .category_specialties(category)
                .into_iter()
                .map(String::from),
        )
    })
}

/// Map the raw model answer to a validated match
fn validate_output(
    taxonomy: &SpecialtyTaxonomy,
    known_specialties: &[String],
    content: &str,
) -> Validated<SpecialtyMatch> {
    if is_no_match(content) {
        return Ok(SpecialtyMatch::Absent);
    }

    let parts: Vec<&str> = content
        .split([',', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match parts.as_slice() {
        [] => Ok(SpecialtyMatch::Absent),
        [single] => resolve_single(taxonomy, known_specialties, single),
        many => Ok(candidates(many.iter().map(|s| s.to_string()))),
    }
}

fn resolve_single(
    taxonomy: &SpecialtyTaxonomy,
    known_specialties: &[String],
    value: &str,
) -> Validated<SpecialtyMatch> {
    if let Some(matched) = detect_by_rule(taxonomy, known_specialties, value) {
        return Ok(matched);
    }

    if let Some(name) =
        text::fuzzy_match(value, known_specialties.iter().map(String::as_str))
    {
        return Ok(SpecialtyMatch::Single(name.to_string()));
    }
    if let Some(name) = text::fuzzy_match(value, taxonomy.all_specialties()) {
        return Ok(SpecialtyMatch::Single(name.to_string()));
    }
    if let Some(category) = text::fuzzy_match(value, taxonomy.categories()) {
        return Ok(candidates(
            taxonomy
                .category_specialties(category)
                .into_iter()
                .map(String::from),
        ));
    }

    Err(ValidationFailure::UnknownSpecialty {
        value: value.to_string(),
    })
}

fn is_no_match(content: &str) -> bool {
    let normalized = text::normalize(content);
    normalized.is_empty()
        || normalized == "aucune correspondance"
        || normalized == "no match"
        || normalized == "no specialty match"
}

/// De-duplicate candidates, preserving first-seen order
fn candidates<I: IntoIterator<Item = String>>(names: I) -> SpecialtyMatch {
    let mut seen = std::collections::BTreeSet::new();
    let list: Vec<String> = names
        .into_iter()
        .filter(|name| seen.insert(text::normalize(name)))
        .collect();
    SpecialtyMatch::MultipleCandidates(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_common::llm::ScriptedModel;

    fn known() -> Vec<String> {
        vec!["Cardiologie".to_string(), "Cataracte".to_string()]
    }

    #[tokio::test]
    async fn test_rule_matches_dataset_specialty_without_model_call() {
        // Empty queue: any model call would fail the test
        let model = ScriptedModel::with_queue(Vec::<String>::new());
        let result = detect_and_validate(
            &model,
            &SpecialtyTaxonomy::new(),
            &known(),
            "Le meilleur hôpital pour cardiologie à Lyon",
        )
        .await
        .unwrap();

        assert!(result.usage.is_zero());
        assert_eq!(
            result.value.unwrap(),
            SpecialtyMatch::Single("Cardiologie".to_string())
        );
    }

    #[tokio::test]
    async fn test_general_cancer_yields_candidates() {
        let model = ScriptedModel::with_queue(Vec::<String>::new());
        let result = detect_and_validate(
            &model,
            &SpecialtyTaxonomy::new(),
            &known(),
            "J'ai un cancer",
        )
        .await
        .unwrap();

        match result.value.unwrap() {
            SpecialtyMatch::MultipleCandidates(list) => {
                assert!(list.contains(&"Cancer du poumon".to_string()));
                assert!(!list.iter().any(|s| s.contains("Chirurgie")));
            }
            other => panic!("expected candidates, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_model_answer_is_fuzzy_validated() {
        let model = ScriptedModel::with_queue(["cataract"]);
        let result = detect_and_validate(
            &model,
            &SpecialtyTaxonomy::new(),
            &known(),
            "Où me faire opérer ?",
        )
        .await
        .unwrap();

        assert!(!result.usage.is_zero());
        assert_eq!(
            result.value.unwrap(),
            SpecialtyMatch::Single("Cataracte".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_match_answer_is_absent() {
        let model = ScriptedModel::with_queue(["aucune correspondance"]);
        let result = detect_and_validate(
            &model,
            &SpecialtyTaxonomy::new(),
            &known(),
            "Je cherche un établissement de soins",
        )
        .await
        .unwrap();

        assert_eq!(result.value.unwrap(), SpecialtyMatch::Absent);
        assert!(!result.usage.is_zero());
    }

    #[test]
    fn test_keyword_context_covers_every_category() {
        let taxonomy = SpecialtyTaxonomy::new();
        let context = keyword_context(&taxonomy);
        for category in taxonomy.categories() {
            assert!(context.contains(category), "missing category {category}");
        }
        assert!(context.contains("Infarctus du myocarde"));
        assert!(context.contains("accouchement"));
    }

    #[test]
    fn test_unknown_single_value_is_rejected() {
        let outcome = resolve_single(&SpecialtyTaxonomy::new(), &known(), "astrologie");
        assert!(matches!(
            outcome,
            Err(ValidationFailure::UnknownSpecialty { .. })
        ));
    }
}
