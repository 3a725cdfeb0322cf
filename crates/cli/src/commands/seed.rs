//! Seed the catalog with sample categories and books.
//!
//! Reads a YAML catalog (the bundled sample by default), validates it, and
//! inserts whatever is missing. Categories are matched by name, books by
//! title, so running the command twice changes nothing.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use peoplecart_storefront::db;

/// Catalog bundled with the binary.
const SAMPLE_CATALOG: &str = include_str!("../../data/sample_catalog.yaml");

/// A catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCatalog {
    pub categories: Vec<String>,
    pub products: Vec<SeedProduct>,
}

/// One book in a catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Present only for books currently on sale.
    #[serde(default)]
    pub sale_price: Option<Decimal>,
}

/// What a seeding run changed.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub categories_inserted: u64,
    pub products_inserted: u64,
    pub products_skipped: u64,
}

/// Check a catalog for problems before touching the database.
///
/// Returns one message per problem; an empty list means the catalog is valid.
#[must_use]
pub fn validate_catalog(catalog: &SeedCatalog) -> Vec<String> {
    let mut errors = Vec::new();
    let categories: HashSet<&str> = catalog.categories.iter().map(String::as_str).collect();

    if categories.len() != catalog.categories.len() {
        errors.push("duplicate category names".to_owned());
    }

    for product in &catalog.products {
        if product.name.trim().is_empty() {
            errors.push("product with an empty name".to_owned());
        }
        if !categories.contains(product.category.as_str()) {
            errors.push(format!(
                "{}: unknown category '{}'",
                product.name, product.category
            ));
        }
        if product.price.is_sign_negative() {
            errors.push(format!("{}: negative price", product.name));
        }
        if let Some(sale) = product.sale_price
            && (sale.is_sign_negative() || sale > product.price)
        {
            errors.push(format!(
                "{}: sale price {sale} outside 0..={}",
                product.name, product.price
            ));
        }
    }

    errors
}

/// Seed the catalog from `file`, or from the bundled sample.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file cannot be read
/// or parsed, validation fails, or a database operation fails.
pub async fn catalog(file: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url().ok_or("STOREFRONT_DATABASE_URL not set")?;

    let content = match file {
        Some(file_path) => {
            let path = Path::new(file_path);
            if !path.exists() {
                return Err(format!("File not found: {file_path}").into());
            }
            info!(path = %file_path, "Loading catalog from file");
            tokio::fs::read_to_string(path).await?
        }
        None => SAMPLE_CATALOG.to_owned(),
    };

    let catalog: SeedCatalog = serde_yaml::from_str(&content)?;
    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Parsed catalog"
    );

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let result = insert_catalog(&pool, &catalog).await?;

    info!("Seeding complete!");
    info!("  Categories inserted: {}", result.categories_inserted);
    info!("  Products inserted: {}", result.products_inserted);
    info!(
        "  Products skipped (already exist): {}",
        result.products_skipped
    );

    Ok(())
}

/// Insert missing categories and products in one transaction.
async fn insert_catalog(pool: &PgPool, catalog: &SeedCatalog) -> Result<SeedResult, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut result = SeedResult::default();

    for name in &catalog.categories {
        let inserted = sqlx::query(
            "INSERT INTO storefront.category (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        result.categories_inserted += inserted;
    }

    for product in &catalog.products {
        let inserted = sqlx::query(
            r"
            INSERT INTO storefront.product
                (name, price, category_id, description, is_sale, sale_price)
            SELECT $1, $2, c.id, $4, $5, $6
            FROM storefront.category c
            WHERE c.name = $3
              AND NOT EXISTS (SELECT 1 FROM storefront.product p WHERE p.name = $1)
            ",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.sale_price.is_some())
        .bind(product.sale_price)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            result.products_skipped += 1;
        } else {
            result.products_inserted += inserted;
        }
    }

    tx.commit().await?;
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn sample() -> SeedCatalog {
        serde_yaml::from_str(SAMPLE_CATALOG).unwrap()
    }

    #[test]
    fn test_sample_catalog_parses() {
        let catalog = sample();
        assert_eq!(catalog.categories.len(), 5);
        assert_eq!(catalog.products.len(), 8);

        let orwell = catalog.products.iter().find(|p| p.name == "1984").unwrap();
        assert_eq!(orwell.price, dec!(13.99));
        assert_eq!(orwell.sale_price, Some(dec!(8.99)));
    }

    #[test]
    fn test_sample_catalog_is_valid() {
        assert!(validate_catalog(&sample()).is_empty());
    }

    #[test]
    fn test_validate_reports_unknown_category() {
        let mut catalog = sample();
        catalog.products.push(SeedProduct {
            name: "Leaves of Grass".to_owned(),
            price: dec!(9.99),
            category: "Poetry".to_owned(),
            description: String::new(),
            sale_price: None,
        });

        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 1);
        assert!(errors.iter().any(|e| e.contains("Poetry")));
    }

    #[test]
    fn test_validate_rejects_sale_above_list_price() {
        let catalog = SeedCatalog {
            categories: vec!["Fiction".to_owned()],
            products: vec![SeedProduct {
                name: "Emma".to_owned(),
                price: dec!(5.00),
                category: "Fiction".to_owned(),
                description: String::new(),
                sale_price: Some(dec!(7.00)),
            }],
        };

        assert_eq!(validate_catalog(&catalog).len(), 1);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let yaml = "categories: []\nproducts: []\nauthors: []\n";
        assert!(serde_yaml::from_str::<SeedCatalog>(yaml).is_err());
    }
}
