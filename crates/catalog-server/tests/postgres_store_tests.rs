//! PostgreSQL store tests
//!
//! Each test starts its own container. Run with:
//!
//! ```bash
//! cargo test -p catalog-server --test postgres_store_tests -- --ignored
//! ```

mod common;

use catalog_common::EntityKind;
use catalog_server::ingest::{upsert_protein, BulkLoader};
use catalog_server::storage::{CatalogStore, Page};
use catalog_server::CatalogError;
use serial_test::serial;
use tempfile::TempDir;

use common::*;

async fn assert_fixture_counts(db: &TestPostgres) {
    let store = db.store();
    assert_eq!(store.count(EntityKind::Organism).await.unwrap(), FIXTURE_ORGANISMS);
    assert_eq!(store.count(EntityKind::Pfam).await.unwrap(), FIXTURE_PFAMS);
    assert_eq!(store.count(EntityKind::Protein).await.unwrap(), FIXTURE_PROTEINS);
    assert_eq!(store.count(EntityKind::Domain).await.unwrap(), FIXTURE_DOMAINS);
    assert_eq!(store.count(EntityKind::ProteinDomain).await.unwrap(), FIXTURE_LINKS);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_bulk_load_into_postgres() {
    init_test_tracing();
    let db = TestPostgres::start().await.expect("start postgres");
    let (_dir, paths) = fixture_dir();

    let report = BulkLoader::with_batch_size(db.store(), 2)
        .load(&paths)
        .await
        .unwrap();

    assert_eq!(report.unsequenced_proteins, 1);
    assert_fixture_counts(&db).await;

    let store = db.store();
    let protein = store.protein("A0A016S8J8").await.unwrap().unwrap();
    assert_eq!(protein.sequence, "");
    let annotations = store.protein_domains(protein.id).await.unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].pfam.domain_id, "PF00001");

    let organism = store.organism(53326).await.unwrap().unwrap();
    let pfams = store.organism_pfams(organism.id).await.unwrap();
    assert_eq!(pfams.len(), 2);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_reload_replaces_catalog() {
    init_test_tracing();
    let db = TestPostgres::start().await.expect("start postgres");
    let (_dir, paths) = fixture_dir();
    let loader = BulkLoader::new(db.store());

    loader.load(&paths).await.unwrap();
    let first = db.store().list_proteins(Page::all()).await.unwrap();

    loader.load(&paths).await.unwrap();
    assert_fixture_counts(&db).await;
    assert_eq!(db.store().list_proteins(Page::all()).await.unwrap(), first);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_failed_reload_rolls_back() {
    init_test_tracing();
    let db = TestPostgres::start().await.expect("start postgres");
    let (_dir, paths) = fixture_dir();
    let loader = BulkLoader::new(db.store());
    loader.load(&paths).await.unwrap();

    // A bad organism aborts the whole load
    let broken = TempDir::new().unwrap();
    let proteins = format!("{PROTEINS_CSV}A0A016S8J9,0,E,Ancylostoma ceylanicum,Bad organism,PF00001,1,9,40\n");
    let bad_paths = write_sources(broken.path(), PFAMS_CSV, &proteins, SEQUENCES_CSV);

    assert!(loader.load(&bad_paths).await.is_err());
    assert_fixture_counts(&db).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_upsert_after_bulk_load() {
    init_test_tracing();
    let db = TestPostgres::start().await.expect("start postgres");
    let (_dir, paths) = fixture_dir();
    BulkLoader::new(db.store()).load(&paths).await.unwrap();
    let store = db.store();

    // Sequences were resynced past the bulk-assigned refs
    let stored = upsert_protein(store.as_ref(), &protein_record("P12345", 53326))
        .await
        .unwrap();
    assert_eq!(stored.organism.genus, "Ancylostoma");
    assert_eq!(store.count(EntityKind::Organism).await.unwrap(), FIXTURE_ORGANISMS);
    assert_eq!(store.count(EntityKind::Pfam).await.unwrap(), FIXTURE_PFAMS + 1);

    let protein = store.protein("P12345").await.unwrap().unwrap();
    assert!(protein.id.get() > FIXTURE_PROTEINS);

    let err = upsert_protein(store.as_ref(), &protein_record("P12345", 9606))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Conflict { kind: EntityKind::Protein, .. }));
    assert!(store.organism(9606).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_schema_rejects_unordered_domain_spans() {
    init_test_tracing();
    let db = TestPostgres::start().await.expect("start postgres");

    sqlx::query("INSERT INTO pfams (domain_id, domain_description) VALUES ('PF00001', '7tm_1')")
        .execute(db.pool())
        .await
        .unwrap();
    for (start, stop) in [(20, 10), (0, 10), (5, 5)] {
        let result = sqlx::query(
            "INSERT INTO domains (pfam_ref, description, start_pos, stop_pos) \
             SELECT id, 'out of order', $1, $2 FROM pfams",
        )
        .bind(start as i64)
        .bind(stop as i64)
        .execute(db.pool())
        .await;

        assert!(result.is_err(), "span {start}..{stop} should be rejected");
    }

    let accepted = sqlx::query(
        "INSERT INTO domains (pfam_ref, description, start_pos, stop_pos) \
         SELECT id, 'ordered', 1, 2 FROM pfams",
    )
    .execute(db.pool())
    .await;
    assert!(accepted.is_ok());
}
