//! Named-institution detection and canonical-list validation
//!
//! One call returns the cited institution names plus an intent tag. Every
//! name must resolve against the canonical registry or the cycle aborts;
//! a missing intent next to named institutions aborts too.

use super::{invoke_tracked, DetectionResult, InstitutionIntent, NamedInstitution};
use crate::{prompts, Validated};
use palmares_common::llm::{self, ChatModel};
use palmares_common::reference::InstitutionRegistry;
use palmares_common::{Result, ValidationFailure};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NamesPayload {
    #[serde(default)]
    institutions: Vec<String>,
    #[serde(default)]
    intent: Option<String>,
}

pub async fn detect_and_validate(
    model: &dyn ChatModel,
    registry: &InstitutionRegistry,
    message: &str,
) -> Result<DetectionResult<Validated<(Vec<NamedInstitution>, InstitutionIntent)>>> {
    let prompt = prompts::institution_names(message);
    let completion = invoke_tracked(model, "institution_names", &prompt).await?;
    let usage = completion.call_usage();
    let validated = validate(registry, &completion.content);
    Ok(DetectionResult::from_call(validated, usage))
}

fn validate(
    registry: &InstitutionRegistry,
    content: &str,
) -> Validated<(Vec<NamedInstitution>, InstitutionIntent)> {
    let payload = llm::extract_json_object(content)
        .and_then(|json| serde_json::from_str::<NamesPayload>(json).ok())
        .unwrap_or(NamesPayload {
            institutions: Vec::new(),
            intent: None,
        });

    let names: Vec<&String> = payload
        .institutions
        .iter()
        .filter(|name| !name.trim().is_empty())
        .collect();

    if names.is_empty() {
        return Ok((Vec::new(), InstitutionIntent::None));
    }

    let intent = payload
        .intent
        .as_deref()
        .and_then(InstitutionIntent::parse)
        .ok_or(ValidationFailure::MissingIntent)?;

    let mut validated = Vec::with_capacity(names.len());
    for name in names {
        let canonical = registry.resolve(name).ok_or_else(|| {
            ValidationFailure::UnrecognizedInstitution { name: name.clone() }
        })?;
        tracing::debug!(detected = %name, canonical = %canonical.name, "institution matched");
        validated.push(NamedInstitution {
            name: canonical.name.clone(),
            category: canonical.category,
        });
    }
    Ok((validated, intent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_common::dataset::InstitutionType;
    use palmares_common::llm::ScriptedModel;

    fn registry() -> InstitutionRegistry {
        InstitutionRegistry::from_entries([
            (
                "Centre Hospitalier Universitaire de Lyon".to_string(),
                InstitutionType::Public,
            ),
            ("Clinique du Parc".to_string(), InstitutionType::Private),
        ])
    }

    #[tokio::test]
    async fn test_no_institutions_detected() {
        let model =
            ScriptedModel::with_queue([r#"{"institutions": [], "intent": "none"}"#]);
        let result = detect_and_validate(&model, &registry(), "Le meilleur hôpital ?")
            .await
            .unwrap();
        let (names, intent) = result.value.unwrap();
        assert!(names.is_empty());
        assert_eq!(intent, InstitutionIntent::None);
    }

    #[tokio::test]
    async fn test_abbreviated_name_resolves_to_canonical_entry() {
        let model = ScriptedModel::with_queue([
            r#"{"institutions": ["CHU de Lyon"], "intent": "single"}"#,
        ]);
        let result = detect_and_validate(&model, &registry(), "Le CHU de Lyon est-il bien classé ?")
            .await
            .unwrap();
        let (names, intent) = result.value.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].name, "Centre Hospitalier Universitaire de Lyon");
        assert_eq!(names[0].category, InstitutionType::Public);
        assert_eq!(intent, InstitutionIntent::Single);
    }

    #[tokio::test]
    async fn test_missing_intent_aborts() {
        let model =
            ScriptedModel::with_queue([r#"{"institutions": ["Clinique du Parc"]}"#]);
        let result = detect_and_validate(&model, &registry(), "Et la Clinique du Parc ?")
            .await
            .unwrap();
        assert_eq!(result.value, Err(ValidationFailure::MissingIntent));
    }

    #[tokio::test]
    async fn test_unknown_name_aborts() {
        let model = ScriptedModel::with_queue([
            r#"{"institutions": ["Hôpital Imaginaire"], "intent": "single"}"#,
        ]);
        let result = detect_and_validate(&model, &registry(), "Et l'Hôpital Imaginaire ?")
            .await
            .unwrap();
        assert!(matches!(
            result.value,
            Err(ValidationFailure::UnrecognizedInstitution { .. })
        ));
    }

    #[tokio::test]
    async fn test_garbage_answer_degrades_to_absent() {
        let model = ScriptedModel::with_queue(["je ne sais pas"]);
        let result = detect_and_validate(&model, &registry(), "Le meilleur hôpital ?")
            .await
            .unwrap();
        let (names, _) = result.value.unwrap();
        assert!(names.is_empty());
    }
}
