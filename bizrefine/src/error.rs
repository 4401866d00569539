use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Classifier timed out after {timeout_ms} ms")]
    ClassifierTimeout { timeout_ms: u64 },

    #[error("Rewrite unavailable: {0}")]
    RewriteUnavailable(String),

    #[error("Malformed response from {capability}: {message}")]
    MalformedExternalResponse {
        capability: &'static str,
        message: String,
    },
}

impl RefineError {
    /// Failures worth one more attempt against an external capability.
    pub fn is_transient(&self) -> bool {
        match self {
            RefineError::ClassifierUnavailable(_) | RefineError::ClassifierTimeout { .. } => true,
            RefineError::Http(e) => e
                .status()
                .map(|status| status.is_server_error())
                .unwrap_or(true),
            _ => false,
        }
    }
}

impl IntoResponse for RefineError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RefineError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RefineError::Processing(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            RefineError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            RefineError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            RefineError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            RefineError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            RefineError::Llm(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            RefineError::LlmUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            RefineError::LlmRateLimit { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("LLM rate limit exceeded, retry after {retry_after:?} seconds"),
            ),
            RefineError::ClassifierUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            RefineError::ClassifierTimeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, self.to_string())
            }
            RefineError::RewriteUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            RefineError::MalformedExternalResponse { .. } => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RefineError>;
