//! Protein domain catalog
//!
//! Normalizes protein, organism and Pfam domain annotations into a relational
//! catalog and serves it over HTTP.
//!
//! # Layout
//!
//! - [`models`] - Entities, validation rules and the coverage calculation
//! - [`ingest`] - Natural-key registry, entity graph builder, bulk loader
//!   and single-record upsert
//! - [`storage`] - The storage capability with PostgreSQL and in-memory
//!   backends
//! - [`features`] - Query and command slices with their HTTP routes
//! - [`api`] - Router assembly and response envelopes
//!
//! # Bulk loading
//!
//! ```rust,ignore
//! use catalog_server::ingest::{BulkLoader, SourcePaths};
//!
//! let loader = BulkLoader::with_batch_size(store, 500);
//! let report = loader.load(&SourcePaths::defaults("data".as_ref())).await?;
//! println!("{} proteins", report.proteins);
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod models;
pub mod storage;

pub use error::{AppError, CatalogError, CatalogResult};
