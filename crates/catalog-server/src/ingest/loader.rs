//! Bulk loader
//!
//! Replaces the whole catalog with the contents of the three bulk sources in
//! one storage transaction. A failed reload leaves the previous catalog in
//! place.

use std::path::{Path, PathBuf};

use catalog_common::sources::{read_source, RawRow};
use catalog_common::{EntityKind, SourceRole};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::graph::{build_bulk_graph, EntityGraph, SkippedRow};
use crate::error::{CatalogError, CatalogResult};
use crate::storage::SharedStore;

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Resolved location of each bulk source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub pfams: PathBuf,
    pub proteins: PathBuf,
    pub sequences: PathBuf,
}

impl SourcePaths {
    /// Default file names under `data_dir`
    pub fn defaults(data_dir: &Path) -> Self {
        Self {
            pfams: data_dir.join(SourceRole::Pfams.default_file_name()),
            proteins: data_dir.join(SourceRole::Proteins.default_file_name()),
            sequences: data_dir.join(SourceRole::Sequences.default_file_name()),
        }
    }

    /// Pick each role's path
    ///
    /// An explicit path wins when it exists. A missing explicit path is
    /// logged and replaced by the default under `data_dir`.
    pub fn resolve(
        data_dir: &Path,
        pfams: Option<PathBuf>,
        proteins: Option<PathBuf>,
        sequences: Option<PathBuf>,
    ) -> Self {
        Self {
            pfams: resolve_one(data_dir, SourceRole::Pfams, pfams),
            proteins: resolve_one(data_dir, SourceRole::Proteins, proteins),
            sequences: resolve_one(data_dir, SourceRole::Sequences, sequences),
        }
    }

    pub fn get(&self, role: SourceRole) -> &Path {
        match role {
            SourceRole::Pfams => &self.pfams,
            SourceRole::Proteins => &self.proteins,
            SourceRole::Sequences => &self.sequences,
        }
    }
}

fn resolve_one(data_dir: &Path, role: SourceRole, explicit: Option<PathBuf>) -> PathBuf {
    let fallback = data_dir.join(role.default_file_name());
    match explicit {
        Some(path) if path.exists() => path,
        Some(path) => {
            warn!(
                role = %role,
                path = %path.display(),
                fallback = %fallback.display(),
                "Source file not found, using default"
            );
            fallback
        },
        None => fallback,
    }
}

/// Outcome of a successful load
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub organisms: u64,
    pub pfams: u64,
    pub proteins: u64,
    pub domains: u64,
    pub links: u64,
    pub skipped_rows: Vec<SkippedRow>,
    pub dropped_sequences: usize,
    pub unsequenced_proteins: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn inserted(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::Organism => self.organisms,
            EntityKind::Pfam => self.pfams,
            EntityKind::Protein => self.proteins,
            EntityKind::Domain => self.domains,
            EntityKind::ProteinDomain => self.links,
        }
    }

    fn record(&mut self, kind: EntityKind, rows: u64) {
        let slot = match kind {
            EntityKind::Organism => &mut self.organisms,
            EntityKind::Pfam => &mut self.pfams,
            EntityKind::Protein => &mut self.proteins,
            EntityKind::Domain => &mut self.domains,
            EntityKind::ProteinDomain => &mut self.links,
        };
        *slot += rows;
    }
}

pub struct BulkLoader {
    store: SharedStore,
    batch_size: usize,
}

impl BulkLoader {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(store: SharedStore, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Read the sources from disk and load them
    #[instrument(skip(self), fields(pfams = %paths.pfams.display(), proteins = %paths.proteins.display()))]
    pub async fn load(&self, paths: &SourcePaths) -> CatalogResult<LoadReport> {
        let pfam_rows = read_source(&paths.pfams, SourceRole::Pfams)?;
        let composite_rows = read_source(&paths.proteins, SourceRole::Proteins)?;
        let sequence_rows = read_source(&paths.sequences, SourceRole::Sequences)?;

        self.load_rows(&pfam_rows, &composite_rows, &sequence_rows).await
    }

    /// Load already-read source rows
    ///
    /// The graph is built before the transaction opens, so an aborting
    /// source never touches storage.
    #[instrument(skip_all, fields(batch_size = self.batch_size))]
    pub async fn load_rows(
        &self,
        pfam_rows: &[RawRow],
        composite_rows: &[RawRow],
        sequence_rows: &[RawRow],
    ) -> CatalogResult<LoadReport> {
        let started_at = Utc::now();
        let graph = build_bulk_graph(pfam_rows, composite_rows, sequence_rows)?;

        let mut tx = self.store.begin().await?;

        for kind in EntityKind::RESET_ORDER {
            let removed = tx.delete_all(kind).await?;
            info!(kind = %kind, removed, "Reset table");
        }
        for kind in EntityKind::RESET_ORDER {
            let remaining = tx.count(kind).await?;
            if remaining != 0 {
                return Err(CatalogError::ResetIncomplete { kind, remaining });
            }
        }

        let mut report = empty_report(&graph, started_at);
        for kind in EntityKind::INSERT_ORDER {
            for batch in graph.batches(kind, self.batch_size) {
                let inserted = tx.bulk_insert(batch).await?;
                report.record(kind, inserted);
            }
        }

        tx.commit().await?;
        report.finished_at = Utc::now();

        info!(
            organisms = report.organisms,
            pfams = report.pfams,
            proteins = report.proteins,
            domains = report.domains,
            links = report.links,
            skipped = report.skipped_rows.len(),
            dropped_sequences = report.dropped_sequences,
            unsequenced_proteins = report.unsequenced_proteins,
            "Catalog load committed"
        );
        Ok(report)
    }
}

fn empty_report(graph: &EntityGraph, started_at: DateTime<Utc>) -> LoadReport {
    LoadReport {
        organisms: 0,
        pfams: 0,
        proteins: 0,
        domains: 0,
        links: 0,
        skipped_rows: graph.skipped_rows.clone(),
        dropped_sequences: graph.dropped_sequences,
        unsequenced_proteins: graph.unsequenced_proteins(),
        started_at,
        finished_at: started_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_existing_explicit_path() {
        let dir = TempDir::new().unwrap();
        let custom = dir.path().join("custom_pfams.csv");
        fs::write(&custom, "domain_id,domain_description\n").unwrap();

        let paths = SourcePaths::resolve(dir.path(), Some(custom.clone()), None, None);
        assert_eq!(paths.pfams, custom);
        assert_eq!(paths.proteins, dir.path().join("assignment_data_set.csv"));
        assert_eq!(
            paths.get(SourceRole::Sequences),
            dir.path().join("assignment_data_sequences.csv")
        );
    }

    #[test]
    fn test_resolve_falls_back_when_explicit_path_is_missing() {
        let dir = TempDir::new().unwrap();
        let paths = SourcePaths::resolve(
            dir.path(),
            Some(dir.path().join("nope.csv")),
            None,
            None,
        );
        assert_eq!(paths, SourcePaths::defaults(dir.path()));
        assert_eq!(paths.pfams, dir.path().join("pfam_descriptions.csv"));
    }
}
