//! Error types shared across the catalog crates

use thiserror::Error;

use crate::types::SourceRole;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised below the engine: reading sources, parsing shared types
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {role} source {path}: {message}")]
    Source {
        role: SourceRole,
        path: String,
        message: String,
    },

    #[error("CSV error in {role} source: {source}")]
    Csv {
        role: SourceRole,
        #[source]
        source: csv::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}
