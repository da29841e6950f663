//! Configuration management for Palmares services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Chat model configuration
    pub llm: LlmConfig,

    /// Geocoding configuration
    pub geocoding: GeocodingConfig,

    /// Ranking dataset configuration
    pub dataset: DatasetConfig,

    /// Search tuning
    pub search: SearchConfig,

    /// Conversation limits enforced by the sanity gate
    pub limits: LimitsConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Answer audit log
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// API key for the chat completion endpoint
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// USD price per prompt token
    #[serde(default = "default_prompt_token_price")]
    pub prompt_token_price: f64,

    /// USD price per completion token
    #[serde(default = "default_completion_token_price")]
    pub completion_token_price: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocodingConfig {
    /// Geocoding endpoint (Nominatim-compatible)
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,

    /// User agent sent to the geocoding service
    #[serde(default = "default_geocoding_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// Path to the per-specialty ranking table (CSV)
    #[serde(default = "default_ranking_path")]
    pub ranking_path: String,

    /// Path to the general/overall ranking table (CSV)
    #[serde(default = "default_general_ranking_path")]
    pub general_ranking_path: String,

    /// Path to the commune gazetteer (CSV), optional
    pub gazetteer_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Ascending radius ladder in kilometers
    #[serde(default = "default_radius_ladder")]
    pub radius_ladder_km: Vec<f64>,

    /// Default number of results when the query does not specify one
    #[serde(default = "default_result_count")]
    pub default_result_count: usize,

    /// Minimum accepted result count
    #[serde(default = "default_min_result_count")]
    pub min_result_count: usize,

    /// Maximum accepted result count
    #[serde(default = "default_max_result_count")]
    pub max_result_count: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Maximum user message length in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Maximum number of turns in one conversation
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Enable the per-cycle answer audit log
    #[serde(default)]
    pub enabled: bool,

    /// Path of the audit CSV file
    #[serde(default = "default_audit_path")]
    pub path: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_chat_model() -> String { crate::DEFAULT_CHAT_MODEL.to_string() }
fn default_llm_timeout() -> u64 { 30 }
fn default_temperature() -> f32 { 0.0 }
fn default_prompt_token_price() -> f64 { 0.000_000_15 }
fn default_completion_token_price() -> f64 { 0.000_000_60 }
fn default_geocoding_endpoint() -> String { "https://nominatim.openstreetmap.org/search".to_string() }
fn default_geocoding_user_agent() -> String { "palmares-distance-calculator".to_string() }
fn default_geocoding_timeout() -> u64 { 10 }
fn default_ranking_path() -> String { "data/ranking.csv".to_string() }
fn default_general_ranking_path() -> String { "data/ranking_general.csv".to_string() }
fn default_radius_ladder() -> Vec<f64> { vec![5.0, 10.0, 50.0, 100.0] }
fn default_result_count() -> usize { 3 }
fn default_min_result_count() -> usize { 1 }
fn default_max_result_count() -> usize { 50 }
fn default_max_message_length() -> usize { 200 }
fn default_max_turns() -> usize { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "palmares".to_string() }
fn default_audit_path() -> String { "data/answers_log.csv".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            llm: LlmConfig {
                api_key: None,
                api_base: None,
                model: default_chat_model(),
                timeout_secs: default_llm_timeout(),
                temperature: default_temperature(),
                prompt_token_price: default_prompt_token_price(),
                completion_token_price: default_completion_token_price(),
            },
            geocoding: GeocodingConfig {
                endpoint: default_geocoding_endpoint(),
                user_agent: default_geocoding_user_agent(),
                timeout_secs: default_geocoding_timeout(),
            },
            dataset: DatasetConfig {
                ranking_path: default_ranking_path(),
                general_ranking_path: default_general_ranking_path(),
                gazetteer_path: None,
            },
            search: SearchConfig {
                radius_ladder_km: default_radius_ladder(),
                default_result_count: default_result_count(),
                min_result_count: default_min_result_count(),
                max_result_count: default_max_result_count(),
            },
            limits: LimitsConfig {
                max_message_length: default_max_message_length(),
                max_turns: default_max_turns(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
            audit: AuditConfig {
                enabled: false,
                path: default_audit_path(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.search.radius_ladder_km, vec![5.0, 10.0, 50.0, 100.0]);
        assert_eq!(config.search.default_result_count, 3);
    }

    #[test]
    fn test_limits_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.limits.max_message_length, 200);
        assert!(config.limits.max_turns > 0);
    }
}
