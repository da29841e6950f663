//! Palmares Common Library
//!
//! Shared code for the Palmares services including:
//! - Error types and handling
//! - Configuration management
//! - Chat-model and geocoding client abstractions
//! - Ranking dataset store
//! - Canonical reference data (specialty taxonomy, gazetteer, institutions)
//! - Cost/token telemetry
//! - Metrics and observability

pub mod config;
pub mod dataset;
pub mod errors;
pub mod geo;
pub mod llm;
pub mod metrics;
pub mod reference;
pub mod telemetry;
pub mod text;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result, ValidationFailure};
pub use telemetry::{CallUsage, CostLedger};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Similarity cutoff shared by every fuzzy-matching validator
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.80;
