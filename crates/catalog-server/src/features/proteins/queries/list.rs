use catalog_common::EntityKind;

use crate::error::CatalogResult;
use crate::features::shared::pagination::{Paginated, PaginationParams};
use crate::models::ProteinSummary;
use crate::storage::CatalogStore;

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn CatalogStore,
    params: PaginationParams,
) -> CatalogResult<Paginated<ProteinSummary>> {
    let page = params.to_page()?;
    let total = store.count(EntityKind::Protein).await?;
    let proteins = store.list_proteins(page).await?;

    let items = proteins.iter().map(ProteinSummary::from).collect();
    Ok(Paginated::from_items(items, &params, total))
}
