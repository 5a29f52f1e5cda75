//! Organism routes
//!
//! - `GET /api/v1/organisms` - List organisms
//! - `GET /api/v1/organisms/:taxa_id/proteins` - Proteins of an organism
//! - `GET /api/v1/organisms/:taxa_id/pfams` - Pfams annotated on an organism

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::queries::{OrganismPfamsQuery, OrganismProteinsQuery};
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::shared::pagination::PaginationParams;
use crate::storage::SharedStore;

pub fn organisms_routes() -> Router<SharedStore> {
    Router::new()
        .route("/", get(list_organisms))
        .route("/:taxa_id/proteins", get(organism_proteins))
        .route("/:taxa_id/pfams", get(organism_pfams))
}

#[tracing::instrument(skip(store))]
async fn list_organisms(
    State(store): State<SharedStore>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    Ok(super::queries::list::handle(store.as_ref(), params)
        .await?
        .into_response())
}

#[tracing::instrument(skip(store))]
async fn organism_proteins(
    State(store): State<SharedStore>,
    Path(taxa_id): Path<i64>,
) -> Result<Response, AppError> {
    let proteins =
        super::queries::proteins::handle(store.as_ref(), OrganismProteinsQuery { taxa_id }).await?;
    Ok(ApiResponse::success(proteins).into_response())
}

#[tracing::instrument(skip(store))]
async fn organism_pfams(
    State(store): State<SharedStore>,
    Path(taxa_id): Path<i64>,
) -> Result<Response, AppError> {
    let pfams = super::queries::pfams::handle(store.as_ref(), OrganismPfamsQuery { taxa_id }).await?;
    Ok(ApiResponse::success(pfams).into_response())
}
