use serde::{Deserialize, Serialize};

use super::get::{find_pfam, GetPfamQuery};
use crate::error::CatalogResult;
use crate::models::Domain;
use crate::storage::CatalogStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PfamDomainsQuery {
    pub domain_id: String,
}

/// Domains referencing the pfam
#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn CatalogStore, query: PfamDomainsQuery) -> CatalogResult<Vec<Domain>> {
    GetPfamQuery {
        domain_id: query.domain_id.clone(),
    }
    .validate()?;

    let pfam = find_pfam(store, &query.domain_id).await?;
    Ok(store.pfam_domains(pfam.id).await?)
}
