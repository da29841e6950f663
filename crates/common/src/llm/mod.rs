//! Chat model client abstraction
//!
//! Provides:
//! - The [`ChatModel`] trait: one formatted prompt in, one completion out,
//!   with token usage and USD cost attached
//! - An OpenAI-compatible HTTP implementation
//! - A scripted implementation for tests and offline runs
//! - Small parsers for the boolean/numeric answers the pipeline expects

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use crate::telemetry::CallUsage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod scripted;

pub use scripted::ScriptedModel;

/// Token usage for one completion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// One chat completion with its usage telemetry
#[derive(Debug, Clone)]
pub struct Completion {
    /// Raw text content returned by the model
    pub content: String,

    /// Token usage reported by the endpoint
    pub usage: TokenUsage,

    /// USD cost computed from per-token prices
    pub cost: f64,
}

impl Completion {
    /// Usage in the shape the cost ledger consumes
    pub fn call_usage(&self) -> CallUsage {
        CallUsage::new(self.cost, self.usage.total_tokens)
    }
}

/// Text-completion capability consumed by the pipeline
///
/// A failed invocation is fatal for the resolution cycle; there is no retry
/// at this layer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one formatted prompt and return the completion
    async fn invoke(&self, prompt: &str) -> Result<Completion>;
}

/// OpenAI-compatible chat completion client
pub struct OpenAiChatModel {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        self.config
            .api_base
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string())
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn invoke(&self, prompt: &str) -> Result<Completion> {
        #[derive(Serialize)]
        struct ChatMessage {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct ChatRequest {
            model: String,
            messages: Vec<ChatMessage>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessageResponse,
        }

        #[derive(Deserialize)]
        struct ChatMessageResponse {
            content: String,
        }

        #[derive(Deserialize, Default)]
        struct ChatUsage {
            #[serde(default)]
            prompt_tokens: u64,
            #[serde(default)]
            completion_tokens: u64,
            #[serde(default)]
            total_tokens: u64,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
            #[serde(default)]
            usage: Option<ChatUsage>,
        }

        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration {
                message: "llm.api_key is not configured".to_string(),
            }
        })?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ChatModel {
                message: format!("chat completion request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ChatModel {
                message: format!("chat completion error {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| AppError::ChatModel {
                message: format!("failed to parse chat completion response: {}", e),
            })?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AppError::ChatModel {
                message: "empty response from chat model".to_string(),
            })?;

        let raw_usage = chat_response.usage.unwrap_or_default();
        let usage = TokenUsage {
            prompt_tokens: raw_usage.prompt_tokens,
            completion_tokens: raw_usage.completion_tokens,
            total_tokens: raw_usage.total_tokens,
        };
        let cost = raw_usage.prompt_tokens as f64 * self.config.prompt_token_price
            + raw_usage.completion_tokens as f64 * self.config.completion_token_price;

        tracing::debug!(
            model = %self.config.model,
            tokens = usage.total_tokens,
            cost = cost,
            "chat completion finished"
        );

        Ok(Completion {
            content,
            usage,
            cost,
        })
    }
}

/// Parse a TRUE/FALSE style model answer
///
/// Returns `None` when the answer is neither; callers decide the fallback.
pub fn parse_boolean(content: &str) -> Option<bool> {
    let trimmed = content.trim().to_lowercase();
    if trimmed.starts_with("true") || trimmed.starts_with("oui") || trimmed.starts_with("vrai") {
        return Some(true);
    }
    if trimmed.starts_with("false") || trimmed.starts_with("non") || trimmed.starts_with("faux") {
        return Some(false);
    }
    None
}

/// Extract the first integer from a model answer, if any
pub fn first_integer(content: &str) -> Option<i64> {
    let re = regex_lite::Regex::new(r"-?\d+").ok()?;
    re.find(content)?.as_str().parse().ok()
}

/// Extract the first JSON object embedded in a model answer
///
/// Models sometimes wrap the object in prose or code fences.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end > start {
        Some(&content[start..=end])
    } else {
        None
    }
}
