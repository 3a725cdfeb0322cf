//! Catalog types: books and the categories they are shelved under.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProductId};

/// A product (book) as read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// List price.
    pub price: Decimal,
    /// Whether the product is currently marked on sale.
    pub is_sale: bool,
    /// Sale price, only meaningful while `is_sale` is set.
    pub sale_price: Option<Decimal>,
    pub category_id: CategoryId,
    pub description: String,
    /// Path or URL of the cover image, if one was uploaded.
    pub image: Option<String>,
}

impl Product {
    /// The price a buyer pays for one unit right now.
    ///
    /// A product flagged as on sale without a sale price is charged at its
    /// list price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        match (self.is_sale, self.sale_price) {
            (true, Some(sale)) => sale,
            _ => self.price,
        }
    }
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Convert a URL slug (`non-fiction`) back into a category name
    /// (`non fiction`) for lookup.
    #[must_use]
    pub fn name_from_slug(slug: &str) -> String {
        slug.replace('-', " ")
    }
}
