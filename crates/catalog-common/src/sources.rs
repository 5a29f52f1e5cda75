//! Bulk source file readers
//!
//! All three bulk sources are header-first, comma-delimited text. Rows are
//! returned as raw fields tagged with their line number; deciding whether a
//! short row is fatal is left to the caller, since that depends on the role
//! the source plays in a load.

use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{CommonError, Result};
use crate::types::SourceRole;

/// One data row from a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source file (the header is line 1)
    pub line: u64,
    pub fields: Vec<String>,
    /// Set when the record's bytes are not valid UTF-8; `fields` is then empty
    pub undecodable: Option<String>,
}

impl RawRow {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields, undecodable: None }
    }

    /// A row whose bytes could not be decoded
    pub fn undecodable(line: u64, message: impl Into<String>) -> Self {
        Self { line, fields: Vec::new(), undecodable: Some(message.into()) }
    }

    /// Field at `index`, if the row is long enough
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Whether the row carries at least the columns `role` expects
    pub fn is_complete_for(&self, role: SourceRole) -> bool {
        self.fields.len() >= role.expected_fields()
    }
}

/// Read every data row of a source file
pub fn read_source<P: AsRef<Path>>(path: P, role: SourceRole) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| CommonError::Source {
        role,
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let rows = read_source_from_reader(file, role)?;
    debug!(role = %role, path = %path.display(), rows = rows.len(), "Read source file");
    Ok(rows)
}

/// Read every data row from any reader, skipping the header line
///
/// A record that is not valid UTF-8 does not fail the read. It comes back as
/// [`RawRow::undecodable`] so the caller decides whether to skip or abort.
pub fn read_source_from_reader<R: Read>(reader: R, role: SourceRole) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.byte_records() {
        let record = record.map_err(|source| CommonError::Csv { role, source })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let fields: std::result::Result<Vec<String>, _> = record
            .iter()
            .map(|bytes| std::str::from_utf8(bytes).map(str::to_string))
            .collect();
        match fields {
            Ok(fields) => rows.push(RawRow::new(line, fields)),
            Err(e) => {
                warn!(role = %role, line, error = %e, "Undecodable source row");
                rows.push(RawRow::undecodable(line, format!("invalid UTF-8: {}", e)));
            },
        }
    }

    Ok(rows)
}
