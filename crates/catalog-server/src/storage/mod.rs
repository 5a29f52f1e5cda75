//! Storage capability
//!
//! The engine talks to storage only through [`CatalogStore`] and the
//! transactions it opens. Two backends implement it:
//!
//! - [`postgres::PgCatalogStore`] for deployments (sqlx, PostgreSQL)
//! - [`memory::MemoryStore`] for tests and file validation runs
//!
//! Dropping a [`CatalogTransaction`] without calling `commit` rolls back
//! everything done through it.

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_common::EntityKind;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::models::{
    Domain, DomainAnnotation, DomainAttrs, DomainRef, Organism, OrganismAttrs, OrganismRef, Pfam,
    PfamAttrs, PfamRef, Protein, ProteinAttrs, ProteinDomain, ProteinRef,
};

pub use memory::MemoryStore;
pub use postgres::PgCatalogStore;

/// Store handle shared by handlers, the loader and the upsert path
pub type SharedStore = Arc<dyn CatalogStore>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{kind} '{key}' already exists")]
    Duplicate { kind: EntityKind, key: String },

    #[error("{kind} row references a missing row: {detail}")]
    MissingReference { kind: EntityKind, detail: String },
}

/// A window into an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Every row
    pub fn all() -> Self {
        Self {
            limit: i64::MAX,
            offset: 0,
        }
    }

    pub(crate) fn bounds(&self) -> (usize, usize) {
        (
            usize::try_from(self.offset.max(0)).unwrap_or(usize::MAX),
            usize::try_from(self.limit.max(0)).unwrap_or(usize::MAX),
        )
    }
}

/// One insert batch of a single entity kind
#[derive(Debug, Clone, Copy)]
pub enum EntityRows<'a> {
    Organisms(&'a [Organism]),
    Pfams(&'a [Pfam]),
    Proteins(&'a [Protein]),
    Domains(&'a [Domain]),
    Links(&'a [ProteinDomain]),
}

impl EntityRows<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRows::Organisms(_) => EntityKind::Organism,
            EntityRows::Pfams(_) => EntityKind::Pfam,
            EntityRows::Proteins(_) => EntityKind::Protein,
            EntityRows::Domains(_) => EntityKind::Domain,
            EntityRows::Links(_) => EntityKind::ProteinDomain,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EntityRows::Organisms(rows) => rows.len(),
            EntityRows::Pfams(rows) => rows.len(),
            EntityRows::Proteins(rows) => rows.len(),
            EntityRows::Domains(rows) => rows.len(),
            EntityRows::Links(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read access plus the ability to open write transactions
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTransaction>>;

    /// Connectivity check
    async fn ping(&self) -> StoreResult<()>;

    async fn count(&self, kind: EntityKind) -> StoreResult<i64>;

    async fn organism(&self, taxa_id: i64) -> StoreResult<Option<Organism>>;
    async fn organism_by_ref(&self, id: OrganismRef) -> StoreResult<Option<Organism>>;
    async fn pfam(&self, domain_id: &str) -> StoreResult<Option<Pfam>>;
    async fn protein(&self, protein_id: &str) -> StoreResult<Option<Protein>>;

    /// Domains linked to a protein, each with its pfam, in domain order
    async fn protein_domains(&self, protein: ProteinRef) -> StoreResult<Vec<DomainAnnotation>>;

    async fn list_organisms(&self, page: Page) -> StoreResult<Vec<Organism>>;
    async fn list_pfams(&self, page: Page) -> StoreResult<Vec<Pfam>>;
    async fn list_proteins(&self, page: Page) -> StoreResult<Vec<Protein>>;
    async fn list_domains(&self, page: Page) -> StoreResult<Vec<Domain>>;

    async fn organism_proteins(&self, organism: OrganismRef) -> StoreResult<Vec<Protein>>;

    /// Distinct pfams annotated on any protein of the organism
    async fn organism_pfams(&self, organism: OrganismRef) -> StoreResult<Vec<Pfam>>;

    async fn pfam_domains(&self, pfam: PfamRef) -> StoreResult<Vec<Domain>>;
}

/// Writes scoped to one unit of work
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Delete every row of a kind, returning how many went
    async fn delete_all(&mut self, kind: EntityKind) -> StoreResult<u64>;

    async fn count(&mut self, kind: EntityKind) -> StoreResult<i64>;

    /// Insert rows whose surrogate refs were assigned by the engine
    async fn bulk_insert(&mut self, rows: EntityRows<'_>) -> StoreResult<u64>;

    /// Existing organism for `taxa_id`, or a new one from `attrs`
    async fn get_or_create_organism(&mut self, attrs: &OrganismAttrs) -> StoreResult<Organism>;

    /// Existing pfam for `domain_id`, or a new one from `attrs`
    async fn get_or_create_pfam(&mut self, attrs: &PfamAttrs) -> StoreResult<Pfam>;

    /// Always inserts; a taken `protein_id` is [`StoreError::Duplicate`]
    async fn create_protein(
        &mut self,
        attrs: &ProteinAttrs,
        organism: OrganismRef,
    ) -> StoreResult<Protein>;

    async fn create_domain(&mut self, attrs: &DomainAttrs, pfam: PfamRef) -> StoreResult<Domain>;

    async fn link(&mut self, protein: ProteinRef, domain: DomainRef) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Open the configured backend
pub async fn init(config: &Config) -> anyhow::Result<SharedStore> {
    match config.store {
        StoreBackend::Memory => {
            info!("Using in-memory catalog store");
            Ok(Arc::new(MemoryStore::new()))
        },
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
                .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
                .connect(&config.database.url)
                .await?;
            info!("Database connection pool established");

            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
            info!("Database migrations completed");

            Ok(Arc::new(PgCatalogStore::new(pool)))
        },
    }
}
