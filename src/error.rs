use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message attached to every failure that is not a model-output problem
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate itinerary";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    /// The language model answered, but not with a usable itinerary.
    /// `raw_response` is already truncated for display.
    #[error("{reason}")]
    ModelOutput {
        reason: String,
        raw_response: String,
    },

    /// A handler panicked; carries the panic message
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Domain failures are reported in the body with a 200 status; clients read
/// the `error` key rather than the HTTP code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self {
            AppError::ModelOutput {
                reason,
                raw_response,
            } => json!({
                "error": reason,
                "raw_response": raw_response,
            }),
            other => json!({
                "error": other.to_string(),
                "message": GENERIC_FAILURE_MESSAGE,
            }),
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
