use axum::extract::State;
use axum::Json;

use crate::api::dto::{AddAcronymRequest, AddAcronymResponse, ErrorBody};
use crate::api::extractors::AppJson;
use crate::api::state::AppState;
use crate::error::Result;

/// `POST /acronyms`
///
/// Adds a definition to the dictionary file. Existing acronyms are left
/// alone and reported with `added: false`.
#[utoipa::path(
    post,
    path = "/acronyms",
    tag = "acronyms",
    request_body = AddAcronymRequest,
    responses(
        (status = 200, description = "Whether the acronym was added", body = AddAcronymResponse),
        (status = 400, description = "Missing or invalid acronym or meaning", body = ErrorBody),
    )
)]
pub async fn add_acronym(
    State(state): State<AppState>,
    AppJson(request): AppJson<AddAcronymRequest>,
) -> Result<Json<AddAcronymResponse>> {
    let added = state.acronyms.add(&request.acronym, &request.meaning).await?;
    Ok(Json(AddAcronymResponse { added }))
}
