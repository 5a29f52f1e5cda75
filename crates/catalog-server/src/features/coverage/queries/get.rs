use catalog_common::EntityKind;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::models::coverage::coverage;
use crate::models::Domain;
use crate::storage::CatalogStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCoverageQuery {
    pub protein_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageResponse {
    pub coverage: f64,
}

impl GetCoverageQuery {
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

/// Fraction of the protein covered by its domains
#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn CatalogStore, query: GetCoverageQuery) -> CatalogResult<CoverageResponse> {
    query.validate()?;

    let protein = store
        .protein(&query.protein_id)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Protein, &query.protein_id))?;
    let domains: Vec<Domain> = store
        .protein_domains(protein.id)
        .await?
        .into_iter()
        .map(|annotation| annotation.domain)
        .collect();

    Ok(CoverageResponse {
        coverage: coverage(&protein, &domains)?,
    })
}
