use catalog_common::EntityKind;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Pfam, PfamAttrs};
use crate::storage::CatalogStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPfamQuery {
    pub domain_id: String,
}

impl GetPfamQuery {
    pub fn validate(&self) -> CatalogResult<()> {
        if self.domain_id.trim().is_empty() {
            return Err(CatalogError::InvalidParameter {
                name: "domain_id",
                message: "domain_id is required".to_string(),
            });
        }
        Ok(())
    }
}

pub(super) async fn find_pfam(store: &dyn CatalogStore, domain_id: &str) -> CatalogResult<Pfam> {
    store
        .pfam(domain_id)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Pfam, domain_id))
}

#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn CatalogStore, query: GetPfamQuery) -> CatalogResult<PfamAttrs> {
    query.validate()?;
    Ok(find_pfam(store, &query.domain_id).await?.attrs())
}
