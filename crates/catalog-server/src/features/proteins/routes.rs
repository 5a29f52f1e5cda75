//! Protein routes
//!
//! - `POST /api/v1/proteins` - Upsert a protein record
//! - `GET /api/v1/proteins` - List proteins
//! - `GET /api/v1/proteins/:protein_id` - Protein detail

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::commands::CreateProteinCommand;
use super::queries::GetProteinQuery;
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::shared::pagination::PaginationParams;
use crate::storage::SharedStore;

pub fn proteins_routes() -> Router<SharedStore> {
    Router::new()
        .route("/", get(list_proteins).post(create_protein))
        .route("/:protein_id", get(get_protein))
}

/// Upsert a protein with its organism and domains
///
/// - `201 Created` - Persisted protein view
/// - `400 Bad Request` - Validation error
/// - `409 Conflict` - `protein_id` already exists
#[tracing::instrument(skip(store, command), fields(protein_id = %command.protein_id))]
async fn create_protein(
    State(store): State<SharedStore>,
    Json(command): Json<CreateProteinCommand>,
) -> Result<Response, AppError> {
    let created = super::commands::create::handle(store.as_ref(), command).await?;

    tracing::info!(protein_id = %created.protein_id, "Protein created via API");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))).into_response())
}

#[tracing::instrument(skip(store))]
async fn get_protein(
    State(store): State<SharedStore>,
    Path(protein_id): Path<String>,
) -> Result<Response, AppError> {
    let view = super::queries::get::handle(store.as_ref(), GetProteinQuery { protein_id }).await?;
    Ok(ApiResponse::success(view).into_response())
}

#[tracing::instrument(skip(store))]
async fn list_proteins(
    State(store): State<SharedStore>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    Ok(super::queries::list::handle(store.as_ref(), params)
        .await?
        .into_response())
}
