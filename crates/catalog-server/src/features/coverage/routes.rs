use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::queries::GetCoverageQuery;
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::storage::SharedStore;

/// `GET /api/v1/coverage/:protein_id`
pub fn coverage_routes() -> Router<SharedStore> {
    Router::new().route("/:protein_id", get(get_coverage))
}

#[tracing::instrument(skip(store))]
async fn get_coverage(
    State(store): State<SharedStore>,
    Path(protein_id): Path<String>,
) -> Result<Response, AppError> {
    let response = super::queries::get::handle(store.as_ref(), GetCoverageQuery { protein_id }).await?;
    Ok(ApiResponse::success(response).into_response())
}
