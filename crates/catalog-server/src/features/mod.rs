//! Feature slices of the catalog API
//!
//! Each feature is a vertical slice:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//!
//! Handlers take a `&dyn CatalogStore` so they run unchanged against either
//! storage backend.

pub mod coverage;
pub mod domains;
pub mod organisms;
pub mod pfams;
pub mod proteins;
pub mod shared;

use axum::Router;

use crate::storage::SharedStore;

/// All feature routes, each under its own path prefix
pub fn router() -> Router<SharedStore> {
    Router::new()
        .nest("/proteins", proteins::proteins_routes())
        .nest("/organisms", organisms::organisms_routes())
        .nest("/pfams", pfams::pfams_routes())
        .nest("/domains", domains::domains_routes())
        .nest("/coverage", coverage::coverage_routes())
}
