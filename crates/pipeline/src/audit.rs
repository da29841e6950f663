//! Per-cycle answer audit trail
//!
//! Appends one CSV row per completed answer cycle. The log is best-effort:
//! callers log a warning on write failure instead of failing the request.

use chrono::Utc;
use palmares_common::config::AuditConfig;
use palmares_common::{CostLedger, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::sync::Mutex;

#[derive(Debug, Serialize)]
struct AuditRow<'a> {
    timestamp: String,
    question: &'a str,
    answer: &'a str,
    outcome: &'a str,
    cost_usd: f64,
    tokens: u64,
}

/// Append-only CSV audit log, disabled when the config says so
pub struct AuditLog {
    writer: Option<Mutex<csv::Writer<std::fs::File>>>,
}

impl AuditLog {
    pub fn open(config: &AuditConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self { writer: None });
        }

        let existing = std::fs::metadata(&config.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(!existing)
            .from_writer(file);
        tracing::info!(path = %config.path, "audit log enabled");
        Ok(Self {
            writer: Some(Mutex::new(writer)),
        })
    }

    /// A log that records nothing, for tests and disabled deployments
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn record(
        &self,
        question: &str,
        answer: &str,
        outcome: &str,
        ledger: &CostLedger,
    ) -> Result<()> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };
        let row = AuditRow {
            timestamp: Utc::now().to_rfc3339(),
            question,
            answer,
            outcome,
            cost_usd: ledger.total_cost(),
            tokens: ledger.total_tokens(),
        };
        let mut guard = writer.lock().expect("audit writer poisoned");
        guard.serialize(row)?;
        guard.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmares_common::CallUsage;

    #[test]
    fn test_disabled_log_records_nothing() {
        let log = AuditLog::disabled();
        log.record("q", "a", "answered", &CostLedger::default())
            .unwrap();
    }

    #[test]
    fn test_rows_append_with_single_header() {
        let dir = std::env::temp_dir().join(format!("palmares-audit-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("audit.csv");
        let config = AuditConfig {
            enabled: true,
            path: path.to_string_lossy().to_string(),
        };

        let ledger = CostLedger {
            specialty: CallUsage::new(0.001, 40),
            ..Default::default()
        };
        AuditLog::open(&config)
            .unwrap()
            .record("q1", "a1", "answered", &ledger)
            .unwrap();
        AuditLog::open(&config)
            .unwrap()
            .record("q2", "a2", "rejected", &ledger)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let headers = contents
            .lines()
            .filter(|l| l.starts_with("timestamp,"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.contains("q2,a2,rejected"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
