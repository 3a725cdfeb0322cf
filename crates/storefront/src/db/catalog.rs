//! Catalog queries.

use rust_decimal::Decimal;
use tracing::instrument;

use peoplecart_core::{Category, CategoryId, Product, ProductId};

use super::{CatalogStore, PgStore, RepositoryError};

const PRODUCT_COLUMNS: &str =
    "id, name, price, is_sale, sale_price, category_id, description, image";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    is_sale: bool,
    sale_price: Option<Decimal>,
    category_id: i32,
    description: String,
    image: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            is_sale: row.is_sale,
            sale_price: row.sale_price,
            category_id: CategoryId::new(row.category_id),
            description: row.description,
            image: row.image,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
}

/// Build an `ILIKE` pattern matching `query` anywhere, with the wildcard
/// characters in the query taken literally.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl CatalogStore for PgStore {
    #[instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Product::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name FROM storefront.category WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|r| Category {
            id: CategoryId::new(r.id),
            name: r.name,
        }))
    }

    #[instrument(skip(self))]
    async fn list_category_products(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE category_id = $1 ORDER BY id"
        ))
        .bind(category.as_i32())
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self))]
    async fn search_products(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product \
             WHERE name ILIKE $1 OR description ILIKE $1 \
             ORDER BY id LIMIT $2"
        ))
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
