//! Shared fixtures for catalog integration tests
//!
//! Source fixtures are written to a temporary directory under their default
//! file names. PostgreSQL tests start a throwaway container with the
//! migrations applied.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_server::ingest::SourcePaths;
use catalog_server::models::{DomainRecord, OrganismAttrs, PfamAttrs, ProteinRecord};
use catalog_server::storage::{MemoryStore, PgCatalogStore, SharedStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tempfile::TempDir;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::info;

pub const PFAMS_CSV: &str = "\
domain_id,domain_description
PF01650,PeptidaseC13family
PF00001,7tm_1
PF00002,7tm_2
";

pub const PROTEINS_CSV: &str = "\
protein_id,taxa_id,clade,genus_species,description,pfam_id,start,stop,length
A0A016S8J7,53326,E,Ancylostoma ceylanicum,Peptidase C13 legumain,PF01650,40,94,101
A0A016S8J7,53326,E,Ancylostoma ceylanicum,GPCR rhodopsin-like,PF00001,60,90,101
A0A014PQC0,1344,B,Staphylococcus haemolyticus,GPCR family 2,PF00002,5,8,50
A0A016S8J8,53326,E,Ancylostoma ceylanicum,GPCR rhodopsin-like,PF00001,10,20,200
";

pub const SEQUENCES_CSV: &str = "\
protein_id,sequence
A0A016S8J7,MVIGLSTLLALLCAQFSGAEA
A0A014PQC0,MHVQLKKHLSDSNQ
UNKNOWN001,MAAAAAAAA
";

/// Expected per-kind counts after loading the fixtures
pub const FIXTURE_ORGANISMS: i64 = 2;
pub const FIXTURE_PFAMS: i64 = 3;
pub const FIXTURE_PROTEINS: i64 = 3;
pub const FIXTURE_DOMAINS: i64 = 4;
pub const FIXTURE_LINKS: i64 = 4;

pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,catalog_server=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}

/// Write the three sources under their default names
pub fn write_sources(dir: &Path, pfams: &str, proteins: &str, sequences: &str) -> SourcePaths {
    let paths = SourcePaths::defaults(dir);
    std::fs::write(&paths.pfams, pfams).expect("write pfams");
    std::fs::write(&paths.proteins, proteins).expect("write proteins");
    std::fs::write(&paths.sequences, sequences).expect("write sequences");
    paths
}

/// Temporary directory holding the standard fixtures
pub fn fixture_dir() -> (TempDir, SourcePaths) {
    let dir = TempDir::new().expect("create temp dir");
    let paths = write_sources(dir.path(), PFAMS_CSV, PROTEINS_CSV, SEQUENCES_CSV);
    (dir, paths)
}

pub fn memory_store() -> (MemoryStore, SharedStore) {
    let store = MemoryStore::new();
    let shared: SharedStore = Arc::new(store.clone());
    (store, shared)
}

/// A valid upsert record with two domains on the same pfam
pub fn protein_record(protein_id: &str, taxa_id: i64) -> ProteinRecord {
    ProteinRecord {
        protein_id: protein_id.to_string(),
        sequence: "MKTAYIAKQRQISFVKSHFSRQ".to_string(),
        length: 100,
        organism: OrganismAttrs {
            taxa_id,
            clade: "E".to_string(),
            genus: "Ancylostoma".to_string(),
            species: "ceylanicum".to_string(),
        },
        domains: vec![
            DomainRecord {
                pfam: PfamAttrs {
                    domain_id: "PF09999".to_string(),
                    domain_description: "Test family".to_string(),
                },
                description: "first".to_string(),
                start: 10,
                stop: 30,
            },
            DomainRecord {
                pfam: PfamAttrs {
                    domain_id: "PF09999".to_string(),
                    domain_description: "Test family".to_string(),
                },
                description: "second".to_string(),
                start: 50,
                stop: 70,
            },
        ],
    }
}

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&format!("postgresql://postgres:postgres@{}:{}/postgres", host, port))
            .await
            .context("Failed to connect to PostgreSQL")?;

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn store(&self) -> SharedStore {
        Arc::new(PgCatalogStore::new(self.pool.clone()))
    }
}
