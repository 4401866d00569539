use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::llm::LlmBackend;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub classifier: ClassifierStatus,
    pub llm: LlmStatus,
    pub acronyms: AcronymStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ClassifierStatus {
    pub backend: String,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AcronymStatus {
    pub entries: usize,
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    let classifier = ClassifierStatus {
        backend: state
            .consistency
            .analyzer()
            .classifier()
            .backend_name()
            .to_string(),
        timeout_secs: state.config.classifier.timeout_secs,
        max_concurrency: state.config.classifier.max_concurrency,
    };

    let llm = match state.llm.backend() {
        LlmBackend::Unavailable { reason } => LlmStatus {
            status: "unavailable".to_string(),
            provider: None,
            model: None,
            reason: Some(reason.clone()),
        },
        backend => LlmStatus {
            status: "available".to_string(),
            provider: Some(backend.to_string()),
            model: state.llm.model().map(str::to_string),
            reason: None,
        },
    };

    Json(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        classifier,
        llm,
        acronyms: AcronymStatus {
            entries: state.acronyms.len().await,
        },
    })
}
