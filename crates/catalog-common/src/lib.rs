//! Protein Catalog Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the protein catalog.
//!
//! # Overview
//!
//! - **Error Handling**: the [`CommonError`] type and result alias
//! - **Logging**: tracing subscriber setup shared by the server and loader binaries
//! - **Sources**: readers for the header-first, comma-delimited bulk source files
//! - **Types**: entity kinds and source roles shared by every layer
//!
//! # Example
//!
//! ```no_run
//! use catalog_common::sources::read_source;
//! use catalog_common::types::SourceRole;
//!
//! fn count_pfams(path: &str) -> catalog_common::Result<usize> {
//!     let rows = read_source(path, SourceRole::Pfams)?;
//!     Ok(rows.len())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{EntityKind, SourceRole};
