use catalog_common::EntityKind;

use crate::error::CatalogResult;
use crate::features::shared::pagination::{Paginated, PaginationParams};
use crate::models::Domain;
use crate::storage::CatalogStore;

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn CatalogStore,
    params: PaginationParams,
) -> CatalogResult<Paginated<Domain>> {
    let page = params.to_page()?;
    let total = store.count(EntityKind::Domain).await?;
    let items = store.list_domains(page).await?;
    Ok(Paginated::from_items(items, &params, total))
}
