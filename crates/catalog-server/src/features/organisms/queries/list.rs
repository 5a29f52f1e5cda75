use catalog_common::EntityKind;

use crate::error::CatalogResult;
use crate::features::shared::pagination::{Paginated, PaginationParams};
use crate::models::Organism;
use crate::storage::CatalogStore;

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn CatalogStore,
    params: PaginationParams,
) -> CatalogResult<Paginated<Organism>> {
    let page = params.to_page()?;
    let total = store.count(EntityKind::Organism).await?;
    let items = store.list_organisms(page).await?;
    Ok(Paginated::from_items(items, &params, total))
}
