use catalog_common::EntityKind;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::models::ProteinRecord;
use crate::storage::CatalogStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetProteinQuery {
    pub protein_id: String,
}

impl GetProteinQuery {
    pub fn validate(&self) -> CatalogResult<()> {
        if self.protein_id.trim().is_empty() {
            return Err(CatalogError::InvalidParameter {
                name: "protein_id",
                message: "protein_id is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Protein view with its organism and domains, surrogates stripped
#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn CatalogStore, query: GetProteinQuery) -> CatalogResult<ProteinRecord> {
    query.validate()?;

    let protein = store
        .protein(&query.protein_id)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Protein, &query.protein_id))?;
    let organism = store
        .organism_by_ref(protein.organism)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Organism, protein.organism))?;
    let annotations = store.protein_domains(protein.id).await?;

    Ok(ProteinRecord::from_parts(&protein, &organism, &annotations))
}
