use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::RefineError;

/// `Json` with rejections reported through [`RefineError`] so malformed
/// bodies get the same `{"error", "code"}` shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(RefineError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for RefineError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let message = err.body_text();
                match missing_field(&message) {
                    Some(field) => RefineError::Validation(format!("Missing required field: {field}")),
                    None => RefineError::Validation(format!("Invalid JSON: {message}")),
                }
            }
            JsonRejection::JsonSyntaxError(err) => {
                RefineError::Validation(format!("JSON syntax error: {}", err.body_text()))
            }
            JsonRejection::MissingJsonContentType(_) => RefineError::Validation(
                "Missing `Content-Type: application/json` header".to_string(),
            ),
            JsonRejection::BytesRejection(_) => {
                RefineError::Internal("Failed to read request body".to_string())
            }
            _ => RefineError::Validation(rejection.body_text()),
        }
    }
}

fn missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
