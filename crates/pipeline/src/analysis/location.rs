//! Two-stage location detection and gazetteer validation
//!
//! Stage one classifies the geographic mention (none, foreign, ambiguous,
//! mentioned). Only on "mentioned" does stage two extract structured fields.
//! Communes and regions are validated fuzzily against the gazetteer,
//! departments and postal codes by exact membership. Two distinct values for
//! the same field abort the cycle.

use super::{invoke_tracked, DetectionResult, LocationScope};
use crate::{prompts, Turn, Validated};
use palmares_common::llm::{self, ChatModel};
use palmares_common::reference::Gazetteer;
use palmares_common::{text, Result, ValidationFailure};
use serde::Deserialize;

/// Outcome of the classification stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationStatus {
    NoneMentioned,
    Foreign,
    Ambiguous,
    Mentioned,
}

impl LocationStatus {
    fn from_code(code: i64) -> Self {
        match code {
            0 => Self::NoneMentioned,
            1 => Self::Foreign,
            3 => Self::Mentioned,
            // Unparseable answers count as ambiguous
            _ => Self::Ambiguous,
        }
    }
}

/// Raw extraction payload returned by the model
#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    location: Vec<ExtractedField>,
}

#[derive(Debug, Deserialize)]
struct ExtractedField {
    #[serde(rename = "type")]
    kind: String,
    value: serde_json::Value,
}

pub async fn detect_and_validate(
    model: &dyn ChatModel,
    gazetteer: &Gazetteer,
    message: &str,
    history: &[Turn],
) -> Result<DetectionResult<Validated<Option<LocationScope>>>> {
    let rendered_history = prompts::format_history(history);

    let status_prompt = prompts::location_status(message, &rendered_history);
    let status_completion = invoke_tracked(model, "location_status", &status_prompt).await?;
    let mut usage = status_completion.call_usage();

    let status = LocationStatus::from_code(
        llm::first_integer(&status_completion.content).unwrap_or(2),
    );
    tracing::debug!(?status, "location status resolved");

    match status {
        LocationStatus::NoneMentioned => {
            return Ok(DetectionResult::from_call(Ok(None), usage));
        }
        LocationStatus::Foreign => {
            return Ok(DetectionResult::from_call(
                Err(ValidationFailure::ForeignLocation),
                usage,
            ));
        }
        LocationStatus::Ambiguous => {
            return Ok(DetectionResult::from_call(
                Err(ValidationFailure::AmbiguousLocation),
                usage,
            ));
        }
        LocationStatus::Mentioned => {}
    }

    let extraction_prompt = prompts::location_extraction(message, &rendered_history);
    let extraction = invoke_tracked(model, "location_extraction", &extraction_prompt).await?;
    usage += extraction.call_usage();

    let validated = parse_and_validate(gazetteer, &extraction.content);
    Ok(DetectionResult::from_call(validated, usage))
}

fn parse_and_validate(gazetteer: &Gazetteer, content: &str) -> Validated<Option<LocationScope>> {
    let Some(json) = llm::extract_json_object(content) else {
        return Err(ValidationFailure::AmbiguousLocation);
    };
    let Ok(payload) = serde_json::from_str::<ExtractionPayload>(json) else {
        return Err(ValidationFailure::AmbiguousLocation);
    };

    let mut fields = FieldValues::default();
    for entry in &payload.location {
        for value in flatten(&entry.value) {
            fields.push(&entry.kind, value)?;
        }
    }
    validate(gazetteer, &fields)
}

/// Collected values per location field
#[derive(Debug, Default)]
struct FieldValues {
    region: Vec<String>,
    department: Vec<String>,
    commune: Vec<String>,
    postal_code: Vec<String>,
}

impl FieldValues {
    fn push(&mut self, kind: &str, value: String) -> Validated<()> {
        let bucket = match kind {
            "region" => &mut self.region,
            "department" => &mut self.department,
            "city_commune" => &mut self.commune,
            "postal_code" => &mut self.postal_code,
            // Unknown field kinds are dropped, not fatal
            _ => return Ok(()),
        };
        let normalized = text::normalize(&value);
        if bucket.iter().any(|v| text::normalize(v) == normalized) {
            return Ok(());
        }
        bucket.push(value);
        if bucket.len() > 1 {
            return Err(ValidationFailure::MultiValuedLocation {
                field: kind.to_string(),
            });
        }
        Ok(())
    }
}

/// Validate collected fields, most specific first
fn validate(gazetteer: &Gazetteer, fields: &FieldValues) -> Validated<Option<LocationScope>> {
    if let Some(value) = fields.commune.first() {
        // Without commune data, accept the extracted spelling as-is
        if !gazetteer.has_communes() {
            return Ok(Some(LocationScope::Commune(value.trim().to_string())));
        }
        return match gazetteer.match_commune(value) {
            Some(canonical) => Ok(Some(LocationScope::Commune(canonical.to_string()))),
            None => Err(ValidationFailure::UnknownLocation {
                value: value.clone(),
            }),
        };
    }
    if let Some(value) = fields.postal_code.first() {
        return match gazetteer.match_postal_code(value) {
            Some(code) => Ok(Some(LocationScope::PostalCode(code))),
            None => Err(ValidationFailure::UnknownLocation {
                value: value.clone(),
            }),
        };
    }
    if let Some(value) = fields.department.first() {
        return match gazetteer.match_department(value) {
            Some(canonical) => Ok(Some(LocationScope::Department(canonical.to_string()))),
            None => Err(ValidationFailure::UnknownLocation {
                value: value.clone(),
            }),
        };
    }
    if let Some(value) = fields.region.first() {
        return match gazetteer.match_region(value) {
            Some(canonical) => Ok(Some(LocationScope::Region(canonical.to_string()))),
            None => Err(ValidationFailure::UnknownLocation {
                value: value.clone(),
            }),
        };
    }
    Ok(None)
}

fn flatten(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        serde_json::Value::Array(items) => items.iter().flat_map(flatten).collect(),
        _ => Vec::new(),
    }
}
