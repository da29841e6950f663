//! Sanity gate
//!
//! Three ordered pre-flight checks run before any detection work: message
//! length, topical pertinence, conversation-length limit. The first failure
//! halts the cycle with its fixed message.

use crate::analysis::invoke_tracked;
use crate::{messages, prompts, Turn};
use palmares_common::config::LimitsConfig;
use palmares_common::llm::{self, ChatModel};
use palmares_common::{CallUsage, Result};
use std::sync::Arc;

/// Outcome of the gate for one turn
#[derive(Debug, Clone)]
pub struct GateVerdict {
    /// Fixed user-facing message when a check failed
    pub rejection: Option<String>,
    /// Usage of the pertinence call, zero when short-circuited before it
    pub usage: CallUsage,
}

impl GateVerdict {
    pub fn passed(&self) -> bool {
        self.rejection.is_none()
    }
}

pub struct SanityGate {
    model: Arc<dyn ChatModel>,
    limits: LimitsConfig,
}

impl SanityGate {
    pub fn new(model: Arc<dyn ChatModel>, limits: LimitsConfig) -> Self {
        Self { model, limits }
    }

    /// Run the checks in order, stopping at the first failure
    pub async fn run(&self, message: &str, history: &[Turn]) -> Result<GateVerdict> {
        if message.chars().count() > self.limits.max_message_length {
            tracing::info!(
                length = message.chars().count(),
                limit = self.limits.max_message_length,
                "message rejected for length"
            );
            return Ok(GateVerdict {
                rejection: Some(messages::MESSAGE_TOO_LONG.to_string()),
                usage: CallUsage::ZERO,
            });
        }

        let prompt = prompts::pertinence(message, &prompts::format_history(history));
        let completion = invoke_tracked(self.model.as_ref(), "pertinence", &prompt).await?;
        let usage = completion.call_usage();
        // An unparseable verdict counts as off-topic
        if !llm::parse_boolean(&completion.content).unwrap_or(false) {
            tracing::info!("message rejected as off-topic");
            return Ok(GateVerdict {
                rejection: Some(messages::MESSAGE_OFF_TOPIC.to_string()),
                usage,
            });
        }

        if history.len() >= self.limits.max_turns {
            tracing::info!(
                turns = history.len(),
                limit = self.limits.max_turns,
                "conversation limit reached"
            );
            return Ok(GateVerdict {
                rejection: Some(messages::CONVERSATION_TOO_LONG.to_string()),
                usage,
            });
        }

        Ok(GateVerdict {
            rejection: None,
            usage,
        })
    }
}
