//! Pfam routes
//!
//! - `GET /api/v1/pfams` - List pfams
//! - `GET /api/v1/pfams/:domain_id` - Pfam detail
//! - `GET /api/v1/pfams/:domain_id/domains` - Domains of a pfam

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::queries::{GetPfamQuery, PfamDomainsQuery};
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::shared::pagination::PaginationParams;
use crate::storage::SharedStore;

pub fn pfams_routes() -> Router<SharedStore> {
    Router::new()
        .route("/", get(list_pfams))
        .route("/:domain_id", get(get_pfam))
        .route("/:domain_id/domains", get(pfam_domains))
}

#[tracing::instrument(skip(store))]
async fn list_pfams(
    State(store): State<SharedStore>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    Ok(super::queries::list::handle(store.as_ref(), params)
        .await?
        .into_response())
}

#[tracing::instrument(skip(store))]
async fn get_pfam(
    State(store): State<SharedStore>,
    Path(domain_id): Path<String>,
) -> Result<Response, AppError> {
    let pfam = super::queries::get::handle(store.as_ref(), GetPfamQuery { domain_id }).await?;
    Ok(ApiResponse::success(pfam).into_response())
}

#[tracing::instrument(skip(store))]
async fn pfam_domains(
    State(store): State<SharedStore>,
    Path(domain_id): Path<String>,
) -> Result<Response, AppError> {
    let domains =
        super::queries::domains::handle(store.as_ref(), PfamDomainsQuery { domain_id }).await?;
    Ok(ApiResponse::success(domains).into_response())
}
