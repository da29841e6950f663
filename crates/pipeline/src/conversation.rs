//! Continuation handling for turns after the first
//!
//! Four sequential yes/no checks decide which of six cases applies. The
//! on-topic check short-circuits; continuity and search-needed always both
//! run; the merge check runs only when both are true.

use crate::analysis::invoke_tracked;
use crate::{messages, prompts, Turn};
use palmares_common::llm::{self, ChatModel};
use palmares_common::{CallUsage, Result};
use std::sync::Arc;

/// How a follow-up turn relates to the prior conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationCase {
    /// Not about the ranking at all
    OffTopic,
    /// Follow-up whose constraints replace conflicting prior ones
    ContinuationMerge,
    /// Follow-up whose constraints add to the prior ones
    ContinuationAdd,
    /// Follow-up answerable without a new data lookup
    ContinuationNoSearch,
    /// Independent question needing a fresh lookup
    NewQuestionWithSearch,
    /// Anything the checks could not place
    FallbackConversational,
}

/// A classified turn with the usage its checks consumed
#[derive(Debug, Clone)]
pub struct Classification {
    pub case: ConversationCase,
    pub usage: CallUsage,
}

pub struct ContinuationClassifier {
    model: Arc<dyn ChatModel>,
}

impl ContinuationClassifier {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Classify a turn after the first into exactly one case
    pub async fn classify(&self, message: &str, history: &[Turn]) -> Result<Classification> {
        let rendered = prompts::format_history(history);
        let mut usage = CallUsage::ZERO;

        let on_topic = self
            .check(&prompts::pertinence(message, &rendered), "on_topic", &mut usage)
            .await?;
        if !on_topic {
            return Ok(Classification {
                case: ConversationCase::OffTopic,
                usage,
            });
        }

        let continuity = self
            .check(&prompts::continuity(message, &rendered), "continuity", &mut usage)
            .await?;
        let search_needed = self
            .check(
                &prompts::search_needed(message, &rendered),
                "search_needed",
                &mut usage,
            )
            .await?;

        let case = match (continuity, search_needed) {
            (true, true) => {
                let merge = self
                    .check(&prompts::merge_query(message, &rendered), "merge", &mut usage)
                    .await?;
                if merge {
                    ConversationCase::ContinuationMerge
                } else {
                    ConversationCase::ContinuationAdd
                }
            }
            (true, false) => ConversationCase::ContinuationNoSearch,
            (false, true) => ConversationCase::NewQuestionWithSearch,
            (false, false) => ConversationCase::FallbackConversational,
        };

        tracing::info!(?case, "follow-up turn classified");
        Ok(Classification { case, usage })
    }

    /// Rewrite a follow-up into a standalone question
    ///
    /// Merge replaces conflicting prior constraints; add unions them. Only
    /// the two continuation-with-search cases call this.
    pub async fn rewrite(
        &self,
        case: ConversationCase,
        message: &str,
        history: &[Turn],
    ) -> Result<(String, CallUsage)> {
        let rendered = prompts::format_history(history);
        let prompt = match case {
            ConversationCase::ContinuationMerge => prompts::rewrite_merge(message, &rendered),
            ConversationCase::ContinuationAdd => prompts::rewrite_add(message, &rendered),
            _ => return Ok((message.to_string(), CallUsage::ZERO)),
        };
        let completion = invoke_tracked(self.model.as_ref(), "rewrite", &prompt).await?;
        let rewritten = completion.content.trim().to_string();
        tracing::debug!(%rewritten, "follow-up rewritten");
        Ok((rewritten, completion.call_usage()))
    }

    /// Free-form conversational reply, no ranking lookup
    pub async fn reply(&self, message: &str, history: &[Turn]) -> Result<(String, CallUsage)> {
        let prompt = prompts::conversational_reply(message, &prompts::format_history(history));
        let completion = invoke_tracked(self.model.as_ref(), "conversation", &prompt).await?;
        let content = completion.content.trim().to_string();
        let usage = completion.call_usage();
        if content.is_empty() {
            return Ok((messages::FALLBACK_UNCLEAR.to_string(), usage));
        }
        Ok((content, usage))
    }

    async fn check(&self, prompt: &str, purpose: &str, usage: &mut CallUsage) -> Result<bool> {
        let completion = invoke_tracked(self.model.as_ref(), purpose, prompt).await?;
        *usage += completion.call_usage();
        // Missing data falls through to the fallback case, never a crash
        let verdict = llm::parse_boolean(&completion.content).unwrap_or(false);
        tracing::debug!(purpose, verdict, "continuation check");
        Ok(verdict)
    }
}
