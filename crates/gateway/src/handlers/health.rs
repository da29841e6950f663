//! Health check handlers

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub dataset: DatasetCheck,
}

#[derive(Serialize)]
pub struct DatasetCheck {
    pub status: String,
    pub specialty_rows: usize,
    pub general_rows: usize,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness probe - verifies the ranking tables are loaded
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let specialty_rows = state.store.records().len();
    let general_rows = state.store.general().len();
    let dataset_status = if specialty_rows > 0 { "ready" } else { "empty" };

    Json(ReadyResponse {
        status: dataset_status.to_string(),
        checks: HealthChecks {
            dataset: DatasetCheck {
                status: dataset_status.to_string(),
                specialty_rows,
                general_rows,
            },
        },
    })
}
