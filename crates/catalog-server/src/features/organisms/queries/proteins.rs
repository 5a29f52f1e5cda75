use catalog_common::EntityKind;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Organism, ProteinSummary};
use crate::storage::CatalogStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrganismProteinsQuery {
    pub taxa_id: i64,
}

impl OrganismProteinsQuery {
    pub fn validate(&self) -> CatalogResult<()> {
        validate_taxa_id(self.taxa_id)
    }
}

pub(super) fn validate_taxa_id(taxa_id: i64) -> CatalogResult<()> {
    if taxa_id <= 0 {
        return Err(CatalogError::InvalidParameter {
            name: "taxa_id",
            message: format!("taxa_id must be greater than 0, got {taxa_id}"),
        });
    }
    Ok(())
}

pub(super) async fn find_organism(store: &dyn CatalogStore, taxa_id: i64) -> CatalogResult<Organism> {
    store
        .organism(taxa_id)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Organism, taxa_id))
}

/// Every protein owned by the organism
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn CatalogStore,
    query: OrganismProteinsQuery,
) -> CatalogResult<Vec<ProteinSummary>> {
    query.validate()?;

    let organism = find_organism(store, query.taxa_id).await?;
    let proteins = store.organism_proteins(organism.id).await?;
    Ok(proteins.iter().map(ProteinSummary::from).collect())
}
