//! Scripted chat model for tests and offline runs
//!
//! Responses are served in registration order, or by prompt-substring rule.
//! Each served completion carries a fixed usage so cost-ledger sums stay
//! deterministic in tests.

use super::{ChatModel, Completion, TokenUsage};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Cost attached to every scripted completion
pub const SCRIPTED_CALL_COST: f64 = 0.001;

/// Tokens attached to every scripted completion
pub const SCRIPTED_CALL_TOKENS: u64 = 40;

enum Script {
    Queue(Mutex<VecDeque<String>>),
    Rules(Vec<(String, String)>),
}

/// Chat model that replays canned answers
pub struct ScriptedModel {
    script: Script,
}

impl ScriptedModel {
    /// Serve `answers` in order; errors when the queue runs dry
    pub fn with_queue<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Script::Queue(Mutex::new(
                answers.into_iter().map(Into::into).collect(),
            )),
        }
    }

    /// Serve the answer of the first rule whose needle occurs in the prompt
    pub fn with_rules<I, S, T>(rules: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            script: Script::Rules(
                rules
                    .into_iter()
                    .map(|(needle, answer)| (needle.into(), answer.into()))
                    .collect(),
            ),
        }
    }

    fn completion(content: String) -> Completion {
        Completion {
            content,
            usage: TokenUsage {
                prompt_tokens: SCRIPTED_CALL_TOKENS / 2,
                completion_tokens: SCRIPTED_CALL_TOKENS / 2,
                total_tokens: SCRIPTED_CALL_TOKENS,
            },
            cost: SCRIPTED_CALL_COST,
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(&self, prompt: &str) -> Result<Completion> {
        match &self.script {
            Script::Queue(queue) => {
                let next = queue
                    .lock()
                    .expect("scripted queue poisoned")
                    .pop_front()
                    .ok_or_else(|| AppError::ChatModel {
                        message: "scripted model exhausted".to_string(),
                    })?;
                Ok(Self::completion(next))
            }
            Script::Rules(rules) => {
                for (needle, answer) in rules {
                    if prompt.contains(needle.as_str()) {
                        return Ok(Self::completion(answer.clone()));
                    }
                }
                Err(AppError::ChatModel {
                    message: format!("no scripted rule matches prompt: {}", prompt),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_serves_in_order() {
        let model = ScriptedModel::with_queue(["un", "deux"]);
        assert_eq!(model.invoke("x").await.unwrap().content, "un");
        assert_eq!(model.invoke("x").await.unwrap().content, "deux");
        assert!(model.invoke("x").await.is_err());
    }

    #[tokio::test]
    async fn test_rules_match_prompt_substring() {
        let model = ScriptedModel::with_rules([("statut", "3"), ("nombre", "5")]);
        assert_eq!(model.invoke("donne le statut svp").await.unwrap().content, "3");
        assert_eq!(model.invoke("quel nombre ?").await.unwrap().content, "5");
    }
}
