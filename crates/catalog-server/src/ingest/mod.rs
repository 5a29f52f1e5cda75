//! Normalization and loading engine
//!
//! - [`registry`] deduplicates entities by natural key within a unit of work
//! - [`graph`] turns the flat bulk sources into an entity graph
//! - [`loader`] replaces the catalog from the bulk sources
//! - [`upsert`] persists one nested protein record

pub mod graph;
pub mod loader;
pub mod registry;
pub mod upsert;

pub use graph::{build_bulk_graph, EntityGraph, GraphBuilder, SkippedRow};
pub use loader::{BulkLoader, LoadReport, SourcePaths, DEFAULT_BATCH_SIZE};
pub use registry::NaturalKeyRegistry;
pub use upsert::{upsert_protein, validate_record};
