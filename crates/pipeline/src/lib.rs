//! Palmares Query-Resolution Pipeline
//!
//! Turns a natural-language question about the yearly hospital ranking into a
//! ranked shortlist with supporting links. The stages are:
//!
//! 1. Sanity gate: message length, topical pertinence, conversation limit
//! 2. Query analysis: five detector/validator pairs producing structured
//!    search parameters plus a cost ledger
//! 3. Continuation classification for turns after the first
//! 4. Resolution against the ranking dataset, with opposite-type and
//!    radius-expansion fallbacks

pub mod analysis;
pub mod answer;
pub mod audit;
pub mod checks;
pub mod conversation;
pub mod messages;
pub mod prompts;
pub mod resolve;

pub use answer::{AnswerOutcome, AnswerPipeline};
pub use conversation::ConversationCase;

/// One completed conversation turn
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

impl Turn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Validation outcomes travel on their own channel, away from fatal errors
pub type Validated<T> = std::result::Result<T, palmares_common::ValidationFailure>;
