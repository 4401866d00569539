use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use crate::consistency::{ComparisonResult, NliLabel};
use crate::rewrite::SectionRewrite;
use crate::tools::CitationStyle;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BizRefine API",
        version = "1.0.0",
        description = "Writing assistant for business documents: cross-sentence consistency checks with suggested fixes, acronym expansion, rewrites and citation formatting.",
    ),
    paths(
        handlers::health::health_check,
        handlers::process::process,
        handlers::upload::upload_docx,
        handlers::acronyms::add_acronym,
    ),
    components(schemas(
        dto::ProcessRequest,
        dto::ProcessResponse,
        dto::ConsistencyResponse,
        dto::ExpandResponse,
        dto::CitationResponse,
        dto::UploadResponse,
        dto::AddAcronymRequest,
        dto::AddAcronymResponse,
        dto::ErrorBody,
        ComparisonResult,
        NliLabel,
        SectionRewrite,
        CitationStyle,
        handlers::health::HealthData,
        handlers::health::ClassifierStatus,
        handlers::health::LlmStatus,
        handlers::health::AcronymStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "process", description = "Consistency check, acronym expansion, rewrite and citation actions"),
        (name = "upload", description = "DOCX text extraction"),
        (name = "acronyms", description = "Acronym dictionary maintenance"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
