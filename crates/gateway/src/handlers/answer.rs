//! Answer endpoint handler

use crate::AppState;
use axum::{extract::State, Json};
use palmares_common::errors::{AppError, Result};
use palmares_common::metrics::RequestMetrics;
use palmares_pipeline::{AnswerOutcome, Turn};
use serde::{Deserialize, Serialize};

/// One answer request: the new message plus the completed turns so far
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub message: String,

    #[serde(default)]
    pub history: Vec<Turn>,
}

/// Either a final answer or a disambiguation prompt
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerResponse {
    Answer {
        text: String,
        links: Vec<String>,
    },
    Disambiguation {
        prompt: String,
        candidates: Vec<String>,
    },
}

pub async fn answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>> {
    let metrics = RequestMetrics::start("POST", "/answer");

    if request.message.trim().is_empty() {
        metrics.finish(400);
        return Err(AppError::Validation {
            message: "message must not be empty".to_string(),
        });
    }

    let outcome = state
        .pipeline
        .answer(&request.message, &request.history)
        .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(error) => {
            metrics.finish(error.status_code().as_u16());
            return Err(error);
        }
    };

    metrics.finish(200);
    let response = match outcome {
        AnswerOutcome::Answer { text, links } => AnswerResponse::Answer { text, links },
        AnswerOutcome::Disambiguation { prompt, candidates } => {
            AnswerResponse::Disambiguation { prompt, candidates }
        }
    };
    Ok(Json(response))
}
