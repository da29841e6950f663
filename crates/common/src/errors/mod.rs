//! Error types for Palmares services
//!
//! Provides a comprehensive error handling system with:
//! - A fatal error channel (`AppError`) for external-capability and system failures
//! - A recoverable channel (`ValidationFailure`) for validator outcomes that
//!   carry a user-facing message instead of aborting the process
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MessageTooLong,

    // Resource errors (4xxx)
    NotFound,
    SpecialtyNotFound,

    // External service errors (8xxx)
    ChatModelError,
    GeocodingError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    DatasetError,
    SerializationError,

    // Service unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::MessageTooLong => 1002,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::SpecialtyNotFound => 4002,

            // External (8xxx)
            ErrorCode::ChatModelError => 8001,
            ErrorCode::GeocodingError => 8002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::DatasetError => 9003,
            ErrorCode::SerializationError => 9004,

            ErrorCode::ServiceUnavailable => 9999,
        }
    }
}

/// Fatal application error types
///
/// These abort a resolution cycle and are surfaced as a generic
/// service-unavailable message; recoverable validator outcomes use
/// [`ValidationFailure`] instead.
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors that escape a validator without recovery
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    // External service errors
    #[error("Chat model call failed: {message}")]
    ChatModel { message: String },

    #[error("Geocoding call failed: {message}")]
    Geocoding { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Dataset error: {message}")]
    Dataset { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::ChatModel { .. } => ErrorCode::ChatModelError,
            AppError::Geocoding { .. } => ErrorCode::GeocodingError,
            AppError::HttpClient(_) => ErrorCode::ChatModelError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Dataset { .. } => ErrorCode::DatasetError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Dataset { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::ChatModel { .. }
            | AppError::Geocoding { .. }
            | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The fixed user-facing message for a halted cycle
    ///
    /// Distinguishes "ranking/classification unavailable" from
    /// "geolocation unavailable" per the original service messages.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Geocoding { .. } => {
                "Dû à une surutilisation de l'API de géolocalisation, le service de calcul \
                 des distances est indisponible pour le moment, merci de réessayer plus tard \
                 ou de recommencer avec une question sans localisation spécifique."
                    .to_string()
            }
            AppError::ChatModel { .. } | AppError::HttpClient(_) => {
                "Je ne peux pas traiter votre demande pour le moment. Merci de réessayer \
                 avec une question relative aux classements des hôpitaux."
                    .to_string()
            }
            _ => "Une erreur est survenue lors de la génération de votre réponse.".to_string(),
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Recoverable validation outcomes
///
/// Raised by entity validators; the query analyst either degrades the entity
/// to "absent" (foreign/ambiguous location) or halts the cycle with the
/// user-facing message (ambiguous multi-location, unrecognized institution,
/// missing intent). Never crosses the HTTP boundary as a raw error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("location is outside France")]
    ForeignLocation,

    #[error("location could not be resolved")]
    AmbiguousLocation,

    #[error("multiple values for location field {field}")]
    MultiValuedLocation { field: String },

    #[error("location {value} not found in gazetteer")]
    UnknownLocation { value: String },

    #[error("institution {name} not in canonical list")]
    UnrecognizedInstitution { name: String },

    #[error("no intent detected for named institutions")]
    MissingIntent,

    #[error("specialty {value} not in taxonomy")]
    UnknownSpecialty { value: String },
}

impl ValidationFailure {
    /// True when the failure halts the whole resolution cycle instead of
    /// degrading one entity to "absent"
    pub fn aborts_cycle(&self) -> bool {
        matches!(
            self,
            ValidationFailure::MultiValuedLocation { .. }
                | ValidationFailure::UnrecognizedInstitution { .. }
                | ValidationFailure::MissingIntent
        )
    }

    /// The fixed user-facing French message for this failure
    pub fn user_message(&self) -> String {
        match self {
            ValidationFailure::ForeignLocation => {
                "Je ne peux pas traiter les demandes concernant des villes étrangères. \
                 Merci de reformuler votre question en mentionnant une ville française."
                    .to_string()
            }
            ValidationFailure::AmbiguousLocation | ValidationFailure::UnknownLocation { .. } => {
                "Je ne parviens pas à détecter votre localisation, merci de reformuler \
                 avec une autre ville."
                    .to_string()
            }
            ValidationFailure::MultiValuedLocation { .. } => {
                "Votre question mentionne plusieurs localisations. Merci de reformuler \
                 en précisant une seule ville, un seul département ou une seule région."
                    .to_string()
            }
            ValidationFailure::UnrecognizedInstitution { .. } => {
                "Le nom de l'établissement que vous avez indiqué n'a pas été évalué dans \
                 le classement des hôpitaux. Merci de reformuler votre question."
                    .to_string()
            }
            ValidationFailure::MissingIntent => {
                "Je n'ai pas bien saisi la nature de votre demande. Merci de reformuler \
                 une question relative aux classements des hôpitaux."
                    .to_string()
            }
            ValidationFailure::UnknownSpecialty { .. } => {
                "Je n'ai pas reconnu la spécialité mentionnée. Merci de reformuler votre \
                 question."
                    .to_string()
            }
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.user_message();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details: None,
                request_id: None, // Should be filled by middleware
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Dataset {
            message: err.to_string(),
        }
    }
}
