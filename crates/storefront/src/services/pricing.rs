//! Cart pricing against the live catalog.

use std::collections::HashMap;

use tracing::instrument;

use peoplecart_core::{CartLine, PricedCart, ProductId, price_cart};

use crate::db::{CatalogStore, RepositoryError};

/// Price a client cart from current catalog data.
///
/// Products are fetched in one round trip. Returns `Ok(None)` when no line
/// names an existing product.
///
/// # Errors
///
/// Returns `RepositoryError` if the catalog cannot be read.
#[instrument(skip(store, lines), fields(lines = lines.len()))]
pub async fn compute_cart<S: CatalogStore>(
    store: &S,
    lines: &[CartLine],
) -> Result<Option<PricedCart>, RepositoryError> {
    if lines.is_empty() {
        return Ok(None);
    }

    let mut ids: Vec<ProductId> = lines.iter().map(|l| l.id).collect();
    ids.sort_unstable();
    ids.dedup();

    let products: HashMap<ProductId, _> = store
        .get_products(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let priced = price_cart(lines, |id| products.get(&id));
    if priced.is_none() {
        tracing::debug!("no cart line resolved to a product");
    }
    Ok(priced)
}
