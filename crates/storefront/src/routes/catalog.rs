//! Catalog JSON endpoints.
//!
//! The browser-side cart is built from these; prices shown here are
//! informational and checkout always reprices.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use peoplecart_core::{Category, Product, ProductId};

use crate::db::CatalogStore;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Number of products returned by an empty search.
pub const FEATURED_LIMIT: i64 = 12;

/// Maximum number of search results.
pub const SEARCH_LIMIT: i64 = 50;

/// Product as exposed to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct ProductJson {
    #[serde(flatten)]
    pub product: Product,
    /// What one unit costs right now.
    pub unit_price: Decimal,
}

impl From<Product> for ProductJson {
    fn from(product: Product) -> Self {
        Self {
            unit_price: product.unit_price(),
            product,
        }
    }
}

fn to_json(products: Vec<Product>) -> Json<Vec<ProductJson>> {
    Json(products.into_iter().map(ProductJson::from).collect())
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// List every product.
#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductJson>>> {
    Ok(to_json(state.store().list_products().await?))
}

/// Show a single product.
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductJson>> {
    state
        .store()
        .get_product(ProductId::new(id))
        .await?
        .map(|p| Json(ProductJson::from(p)))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// List the products in a category.
///
/// The URL uses hyphens for spaces (`Science-Fiction`). Names that contain a
/// real hyphen (`Non-Fiction`) are found by falling back to the raw slug.
#[instrument(skip(state))]
pub async fn category_products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ProductJson>>> {
    let store = state.store();
    let category = find_category(store, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    Ok(to_json(store.list_category_products(category.id).await?))
}

/// Resolve a category URL slug to a category.
///
/// # Errors
///
/// Returns `RepositoryError` if the catalog cannot be read.
pub async fn find_category<S: CatalogStore>(
    store: &S,
    slug: &str,
) -> std::result::Result<Option<Category>, crate::db::RepositoryError> {
    let name = Category::name_from_slug(slug);
    if let Some(category) = store.get_category_by_name(&name).await? {
        return Ok(Some(category));
    }
    if name == slug {
        return Ok(None);
    }
    store.get_category_by_name(slug).await
}

/// Search products by name or description.
///
/// An empty query returns the first few products instead of nothing.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductJson>>> {
    let q = query.q.trim();
    let store = state.store();

    let products = if q.is_empty() {
        let mut all = store.list_products().await?;
        all.truncate(usize::try_from(FEATURED_LIMIT).unwrap_or(0));
        all
    } else {
        store.search_products(q, SEARCH_LIMIT).await?
    };

    tracing::debug!(query = q, results = products.len(), "catalog search");
    Ok(to_json(products))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use peoplecart_core::CategoryId;

    use super::*;
    use crate::db::MemoryStore;

    fn store_with_categories() -> MemoryStore {
        let store = MemoryStore::new();
        for (id, name) in [(1, "Non-Fiction"), (2, "Science Fiction")] {
            store.insert_category(Category {
                id: CategoryId::new(id),
                name: name.to_owned(),
            });
        }
        store
    }

    #[tokio::test]
    async fn test_find_category_replaces_hyphens() {
        let store = store_with_categories();
        let found = find_category(&store, "Science-Fiction").await.unwrap();
        assert_eq!(found.unwrap().id, CategoryId::new(2));
    }

    #[tokio::test]
    async fn test_find_category_falls_back_to_hyphenated_name() {
        let store = store_with_categories();
        let found = find_category(&store, "Non-Fiction").await.unwrap();
        assert_eq!(found.unwrap().id, CategoryId::new(1));
    }

    #[tokio::test]
    async fn test_find_category_unknown() {
        let store = store_with_categories();
        assert!(find_category(&store, "Poetry").await.unwrap().is_none());
    }

    #[test]
    fn test_product_json_includes_unit_price() {
        let product = Product {
            id: ProductId::new(3),
            name: "Dune".to_owned(),
            price: dec!(18.99),
            is_sale: true,
            sale_price: Some(dec!(12.50)),
            category_id: CategoryId::new(2),
            description: String::new(),
            image: None,
        };

        let value = serde_json::to_value(ProductJson::from(product)).unwrap();
        assert_eq!(value["name"], "Dune");
        assert_eq!(value["unit_price"], "12.50");
    }
}
