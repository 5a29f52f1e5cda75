//! Engine and HTTP error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_common::{CommonError, EntityKind, SourceRole};
use serde_json::json;
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::models::validation::ValidationFailure;
use crate::storage::StoreError;

/// Result type alias for engine operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Everything the engine can fail with
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("{kind} '{key}' not found")]
    NotFound { kind: EntityKind, key: String },

    #[error("Malformed {role} row at line {line}: {message}")]
    MalformedInput {
        role: SourceRole,
        line: u64,
        message: String,
    },

    #[error("{kind} '{key}' already exists")]
    Conflict { kind: EntityKind, key: String },

    #[error("Reset left {remaining} {kind} rows behind")]
    ResetIncomplete { kind: EntityKind, remaining: i64 },

    #[error("Coverage is undefined for protein '{protein_id}': length is not positive")]
    UndefinedCoverage { protein_id: String },

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error(transparent)]
    Source(#[from] CommonError),
}

impl CatalogError {
    pub fn not_found(kind: EntityKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn malformed(role: SourceRole, line: u64, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            role,
            line,
            message: message.into(),
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { kind, key } => CatalogError::Conflict { kind, key },
            other => CatalogError::Storage(other),
        }
    }
}

/// Error returned by HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", message),
            ),
            AppError::Catalog(err) => match err {
                CatalogError::Validation(failure) => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(
                        "VALIDATION_ERROR",
                        failure.to_string(),
                        json!({ "kind": failure.kind, "rule": failure.rule.code() }),
                    ),
                ),
                CatalogError::InvalidParameter { .. } => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("VALIDATION_ERROR", err.to_string()),
                ),
                CatalogError::MalformedInput { .. } => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("MALFORMED_INPUT", err.to_string()),
                ),
                CatalogError::NotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("NOT_FOUND", err.to_string()),
                ),
                CatalogError::Conflict { .. } => (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("CONFLICT", err.to_string()),
                ),
                CatalogError::UndefinedCoverage { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse::new("UNDEFINED_COVERAGE", err.to_string()),
                ),
                CatalogError::ResetIncomplete { .. }
                | CatalogError::Storage(_)
                | CatalogError::Source(_) => {
                    tracing::error!(error = %err, "Internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
                    )
                },
            },
        };

        (status, Json(body)).into_response()
    }
}
