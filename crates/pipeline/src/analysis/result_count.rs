//! Requested result-count detection
//!
//! Values outside the configured bounds are discarded, not clamped; the
//! analyst then falls back to the default.

use super::{invoke_tracked, DetectionResult};
use crate::prompts;
use palmares_common::config::SearchConfig;
use palmares_common::llm::{self, ChatModel};
use palmares_common::Result;

pub async fn detect(
    model: &dyn ChatModel,
    search: &SearchConfig,
    message: &str,
) -> Result<DetectionResult<Option<usize>>> {
    let prompt = prompts::result_count(message);
    let completion = invoke_tracked(model, "result_count", &prompt).await?;
    let value = llm::first_integer(&completion.content).and_then(|n| {
        let n = usize::try_from(n).ok()?;
        (search.min_result_count..=search.max_result_count)
            .contains(&n)
            .then_some(n)
    });
    Ok(DetectionResult::from_call(value, completion.call_usage()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_common::llm::ScriptedModel;

    fn search() -> SearchConfig {
        SearchConfig {
            radius_ladder_km: vec![5.0, 10.0, 50.0, 100.0],
            default_result_count: 3,
            min_result_count: 1,
            max_result_count: 50,
        }
    }

    #[tokio::test]
    async fn test_in_range_count_is_kept() {
        let model = ScriptedModel::with_queue(["Je pense que 5 conviendrait."]);
        let result = detect(&model, &search(), "Les 5 meilleurs hôpitaux ?")
            .await
            .unwrap();
        assert_eq!(result.value, Some(5));
    }

    #[tokio::test]
    async fn test_out_of_range_count_is_discarded() {
        for answer in ["0", "51", "-2", "aucune correspondance"] {
            let model = ScriptedModel::with_queue([answer]);
            let result = detect(&model, &search(), "Tous les hôpitaux ?").await.unwrap();
            assert_eq!(result.value, None, "answer {:?} should be discarded", answer);
        }
    }
}
