use crate::error::CatalogResult;
use crate::ingest::upsert::upsert_protein;
use crate::models::ProteinRecord;
use crate::storage::CatalogStore;

/// Upsert request body, the nested protein record
pub type CreateProteinCommand = ProteinRecord;

pub async fn handle(
    store: &dyn CatalogStore,
    command: CreateProteinCommand,
) -> CatalogResult<ProteinRecord> {
    upsert_protein(store, &command).await
}
