use serde::{Deserialize, Serialize};

use super::proteins::{find_organism, validate_taxa_id};
use crate::error::CatalogResult;
use crate::models::Pfam;
use crate::storage::CatalogStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrganismPfamsQuery {
    pub taxa_id: i64,
}

/// Distinct pfams annotated on any of the organism's proteins
#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn CatalogStore, query: OrganismPfamsQuery) -> CatalogResult<Vec<Pfam>> {
    validate_taxa_id(query.taxa_id)?;

    let organism = find_organism(store, query.taxa_id).await?;
    Ok(store.organism_pfams(organism.id).await?)
}
