//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming for the answer pipeline.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all Palmares metrics
pub const METRICS_PREFIX: &str = "palmares";

/// Histogram buckets for answer-cycle latency (in seconds)
///
/// Cycles include one or more chat-model round trips, so the tail is long.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.050, 0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.00, 30.00,
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Answer-cycle metrics
    describe_counter!(
        format!("{}_answer_cycles_total", METRICS_PREFIX),
        Unit::Count,
        "Total answer cycles, labeled with their outcome"
    );

    describe_histogram!(
        format!("{}_answer_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end answer cycle latency in seconds"
    );

    describe_gauge!(
        format!("{}_answer_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of ranking records returned by a resolution"
    );

    // Chat-model metrics
    describe_counter!(
        format!("{}_llm_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total chat-model calls"
    );

    describe_counter!(
        format!("{}_llm_tokens_total", METRICS_PREFIX),
        Unit::Count,
        "Total tokens consumed by chat-model calls"
    );

    describe_counter!(
        format!("{}_llm_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total chat-model call failures"
    );

    // Geocoding metrics
    describe_counter!(
        format!("{}_geocoding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total geocoding lookups"
    );

    describe_counter!(
        format!("{}_geocoding_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total geocoding failures"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record an answer cycle and its outcome label
pub fn record_answer_cycle(duration_secs: f64, outcome: &str, result_count: usize) {
    counter!(
        format!("{}_answer_cycles_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_answer_duration_seconds", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_answer_results_count", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .set(result_count as f64);
}

/// Record a chat-model call
pub fn record_llm_call(purpose: &str, tokens: u64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_llm_calls_total", METRICS_PREFIX),
        "purpose" => purpose.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        counter!(
            format!("{}_llm_tokens_total", METRICS_PREFIX),
            "purpose" => purpose.to_string()
        )
        .increment(tokens);
    } else {
        counter!(
            format!("{}_llm_errors_total", METRICS_PREFIX),
            "purpose" => purpose.to_string()
        )
        .increment(1);
    }
}

/// Record a geocoding lookup
pub fn record_geocoding(success: bool) {
    counter!(format!("{}_geocoding_requests_total", METRICS_PREFIX)).increment(1);
    if !success {
        counter!(format!("{}_geocoding_errors_total", METRICS_PREFIX)).increment(1);
    }
}
