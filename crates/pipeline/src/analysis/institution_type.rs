//! Public/private institution-type detection

use super::{invoke_tracked, DetectionResult};
use crate::prompts;
use palmares_common::dataset::InstitutionType;
use palmares_common::llm::ChatModel;
use palmares_common::{text, Result};

pub async fn detect(
    model: &dyn ChatModel,
    message: &str,
) -> Result<DetectionResult<Option<InstitutionType>>> {
    let prompt = prompts::institution_type(message);
    let completion = invoke_tracked(model, "institution_type", &prompt).await?;
    let value = normalize_answer(&completion.content);
    Ok(DetectionResult::from_call(value, completion.call_usage()))
}

/// Fold French and English spelling variants into the two categories
fn normalize_answer(content: &str) -> Option<InstitutionType> {
    let normalized = text::normalize(content);
    if ["public", "publique", "publics"]
        .iter()
        .any(|v| text::contains_term(&normalized, v))
    {
        return Some(InstitutionType::Public);
    }
    if ["prive", "privee", "prives", "private"]
        .iter()
        .any(|v| text::contains_term(&normalized, v))
    {
        return Some(InstitutionType::Private);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_common::llm::ScriptedModel;

    #[test]
    fn test_normalize_answer_variants() {
        assert_eq!(normalize_answer("public"), Some(InstitutionType::Public));
        assert_eq!(normalize_answer("Publique"), Some(InstitutionType::Public));
        assert_eq!(normalize_answer("privé"), Some(InstitutionType::Private));
        assert_eq!(normalize_answer("Private"), Some(InstitutionType::Private));
        assert_eq!(normalize_answer("aucune correspondance"), None);
    }

    #[tokio::test]
    async fn test_detect_private() {
        let model = ScriptedModel::with_queue(["privé"]);
        let result = detect(&model, "Une clinique privée pour la cataracte ?")
            .await
            .unwrap();
        assert_eq!(result.value, Some(InstitutionType::Private));
        assert!(!result.usage.is_zero());
    }
}
