use axum::extract::State;
use axum::Json;

use crate::api::dto::{
    CitationResponse, ConsistencyResponse, ErrorBody, ExpandResponse, ProcessRequest,
    ProcessResponse,
};
use crate::api::extractors::AppJson;
use crate::api::state::AppState;
use crate::error::{RefineError, Result};
use crate::tools::citation;

const DEFAULT_CITATION_STYLE: &str = "apa";

/// `POST /process`
///
/// Dispatches on `action`. Only `consistency` can fail after validation:
/// with a 503 when the classifier failed on every sentence pair.
#[utoipa::path(
    post,
    path = "/process",
    tag = "process",
    request_body = ProcessRequest,
    responses(
        (status = 200, description = "Action result; shape depends on the action", body = ProcessResponse),
        (status = 400, description = "Missing text or unknown action", body = ErrorBody),
        (status = 503, description = "Classifier unavailable for the whole document", body = ErrorBody),
    )
)]
pub async fn process(
    State(state): State<AppState>,
    AppJson(request): AppJson<ProcessRequest>,
) -> Result<Json<ProcessResponse>> {
    let text = request.text.unwrap_or_default();
    if text.is_empty() {
        return Err(RefineError::Validation("No text provided".to_string()));
    }

    let action = request.action.unwrap_or_default();
    tracing::debug!(action = %action, chars = text.len(), "Processing request");

    let response = match action.as_str() {
        "consistency" => {
            let report = state.consistency.check(&text).await?;
            ProcessResponse::Consistency(ConsistencyResponse::from(report))
        }
        "expand" => ProcessResponse::Expand(ExpandResponse::from(state.acronyms.expand(&text).await)),
        "rewrite" => ProcessResponse::Rewrite(state.rewriter().rewrite_section(&text).await),
        "citation" => {
            let style = request
                .style
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CITATION_STYLE.to_string());
            ProcessResponse::Citation(CitationResponse {
                result: citation::format(&style, &text),
                detected: citation::detect_style(&text),
            })
        }
        other => {
            return Err(RefineError::Validation(format!("Unknown action '{other}'")));
        }
    };

    Ok(Json(response))
}
