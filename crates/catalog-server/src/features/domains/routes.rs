use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::features::shared::pagination::PaginationParams;
use crate::storage::SharedStore;

/// `GET /api/v1/domains`
pub fn domains_routes() -> Router<SharedStore> {
    Router::new().route("/", get(list_domains))
}

#[tracing::instrument(skip(store))]
async fn list_domains(
    State(store): State<SharedStore>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    Ok(super::queries::list::handle(store.as_ref(), params)
        .await?
        .into_response())
}
