//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `peoplecart`
//!
//! ## Tables (schema `storefront`)
//!
//! - `category` - Catalog categories
//! - `product` - Books with list and sale prices
//! - `app_user` - Site accounts (read-only here)
//! - `customer` - Buyers, unique by email
//! - `order_line` - One row per purchased product
//! - `payment_notification` - Processed transaction ids
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Storage seams
//!
//! Services talk to storage through the [`CatalogStore`], [`AccountStore`],
//! [`OrderStore`], and [`NotificationLedger`] traits. [`PgStore`] implements
//! all of them; an in-memory implementation backs the tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p peoplecart-cli -- migrate
//! ```

pub mod accounts;
pub mod catalog;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod notifications;
pub mod orders;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use peoplecart_core::{Category, CategoryId, Product, ProductId, UserId};

use crate::models::{Customer, NewCustomer, NewOrder, Order, User};

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the product catalog.
pub trait CatalogStore: Send + Sync {
    /// Look up one product.
    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Look up several products at once. Unknown ids are absent from the
    /// result; order is unspecified.
    fn get_products(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// Every product, ordered by id.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// Look up a category by its exact name.
    fn get_category_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Products shelved under a category, ordered by id.
    fn list_category_products(
        &self,
        category: CategoryId,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// Case-insensitive substring match on name or description.
    fn search_products(
        &self,
        query: &str,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;
}

/// Read access to site accounts.
pub trait AccountStore: Send + Sync {
    /// Look up an account by id.
    fn get_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;
}

/// Writes performed when a payment is materialized.
pub trait OrderStore: Send + Sync {
    /// Return the customer with this email, creating it if absent.
    ///
    /// Must be atomic: two concurrent calls for the same new email yield one
    /// row.
    fn get_or_create_customer(
        &self,
        customer: &NewCustomer,
    ) -> impl Future<Output = Result<Customer, RepositoryError>> + Send;

    /// Insert the paid orders of one checkout, all or nothing.
    ///
    /// Orders whose product no longer exists are left out of the result;
    /// every other failure writes no rows at all.
    fn create_orders(
        &self,
        orders: &[NewOrder],
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;
}

/// A processed (or in-flight) payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub txn_id: String,
    pub outcome: String,
    pub orders_created: i32,
    /// When the current claim was taken.
    pub received_at: DateTime<Utc>,
}

/// Outcome stored while a notification is being worked on.
pub const OUTCOME_PROCESSING: &str = "processing";

/// Age after which an unfinished claim is considered abandoned.
pub const CLAIM_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Ledger of processor transaction ids, used to drop redeliveries.
pub trait NotificationLedger: Send + Sync {
    /// Claim a transaction id. Returns `false` when it was already claimed.
    ///
    /// A claim still `processing` after [`CLAIM_TIMEOUT`] belongs to a worker
    /// that died; it is taken over and the call returns `true`.
    fn claim_transaction(
        &self,
        txn_id: &str,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Drop an unfinished claim so a redelivery can try again.
    fn release_transaction(
        &self,
        txn_id: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Record how a claimed transaction ended.
    fn finish_transaction(
        &self,
        txn_id: &str,
        outcome: &str,
        orders_created: i32,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// `PostgreSQL`-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
