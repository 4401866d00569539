use axum::extract::Multipart;
use axum::Json;

use crate::api::dto::{ErrorBody, UploadResponse};
use crate::error::{RefineError, Result};
use crate::processing::DocxExtractor;

pub(crate) const MAX_UPLOAD_SIZE: usize = 25 * 1024 * 1024; // 25 MB

/// `POST /upload`
///
/// Accepts a multipart form with a `.docx` in the `file` field and returns
/// its paragraphs as plain text.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "upload",
    request_body(content_type = "multipart/form-data", content = String, description = "A .docx file in the `file` field"),
    responses(
        (status = 200, description = "Extracted text", body = UploadResponse),
        (status = 400, description = "No file, or not a .docx", body = ErrorBody),
        (status = 422, description = "The file could not be parsed", body = ErrorBody),
    )
)]
pub async fn upload_docx(mut multipart: Multipart) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RefineError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(RefineError::Validation("No selected file".to_string()));
        }
        if !file_name.to_lowercase().ends_with(".docx") {
            return Err(RefineError::Validation(
                "Invalid file type. Please upload a .docx file.".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| RefineError::Validation(format!("Failed to read file: {e}")))?;
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(RefineError::Validation(format!(
                "File too large: {} bytes (max {MAX_UPLOAD_SIZE} bytes)",
                bytes.len()
            )));
        }

        tracing::info!(file = %file_name, bytes = bytes.len(), "Extracting uploaded document");
        let text = DocxExtractor::extract(&bytes)?;
        return Ok(Json(UploadResponse { text }));
    }

    Err(RefineError::Validation("No file uploaded".to_string()))
}
