//! In-memory store for tests and local demos.
//!
//! Implements every storage trait over plain collections behind a mutex.
//! Customer creation is atomic under the lock, matching the unique email
//! constraint of the `PostgreSQL` schema, and an order batch is committed
//! only if every insert in it succeeds. [`MemoryStore::set_unavailable`],
//! [`MemoryStore::set_order_writes_failing`], and
//! [`MemoryStore::fail_order_write`] simulate infrastructure failures.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{TimeDelta, Utc};

use peoplecart_core::{Category, CategoryId, CustomerId, OrderId, Product, ProductId, UserId};

use super::{
    AccountStore, CLAIM_TIMEOUT, CatalogStore, NotificationLedger, NotificationRecord,
    OUTCOME_PROCESSING, OrderStore, RepositoryError,
};
use crate::models::{Customer, NewCustomer, NewOrder, Order, User};

#[derive(Debug, Default)]
struct Data {
    categories: Vec<Category>,
    products: BTreeMap<ProductId, Product>,
    users: HashMap<UserId, User>,
    customers: Vec<Customer>,
    orders: Vec<Order>,
    notifications: HashMap<String, NotificationRecord>,
    unavailable: bool,
    order_writes_failing: bool,
    /// Order inserts left until one fails.
    order_write_countdown: Option<usize>,
}

impl Data {
    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            return Err(RepositoryError::Unavailable("memory store offline".to_owned()));
        }
        Ok(())
    }
}

/// Store backed by in-process collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a category.
    pub fn insert_category(&self, category: Category) {
        self.data().categories.push(category);
    }

    /// Add or replace a product.
    pub fn insert_product(&self, product: Product) {
        self.data().products.insert(product.id, product);
    }

    /// Remove a product, as if it were deleted from the catalog.
    pub fn remove_product(&self, id: ProductId) {
        self.data().products.remove(&id);
    }

    /// Add or replace an account.
    pub fn insert_user(&self, user: User) {
        self.data().users.insert(user.id, user);
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.data().unavailable = unavailable;
    }

    /// Make order inserts fail while everything else keeps working.
    pub fn set_order_writes_failing(&self, failing: bool) {
        self.data().order_writes_failing = failing;
    }

    /// Make the `n`th order insert from now on fail, rolling back its batch.
    pub fn fail_order_write(&self, n: usize) {
        self.data().order_write_countdown = Some(n.max(1));
    }

    /// Move a ledger entry's claim time into the past.
    pub fn age_notification(&self, txn_id: &str, by: TimeDelta) {
        if let Some(record) = self.data().notifications.get_mut(txn_id)
            && let Some(earlier) = record.received_at.checked_sub_signed(by)
        {
            record.received_at = earlier;
        }
    }

    /// Snapshot of all customers.
    #[must_use]
    pub fn customers(&self) -> Vec<Customer> {
        self.data().customers.clone()
    }

    /// Snapshot of all orders, in insertion order.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.data().orders.clone()
    }

    /// The ledger entry for a transaction id, if any.
    #[must_use]
    pub fn notification(&self, txn_id: &str) -> Option<NotificationRecord> {
        self.data().notifications.get(txn_id).cloned()
    }
}

impl CatalogStore for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let data = self.data();
        data.check_available()?;
        Ok(data.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data();
        data.check_available()?;
        Ok(data
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data();
        data.check_available()?;
        Ok(data.products.values().cloned().collect())
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let data = self.data();
        data.check_available()?;
        Ok(data.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn list_category_products(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data();
        data.check_available()?;
        Ok(data
            .products
            .values()
            .filter(|p| p.category_id == category)
            .cloned()
            .collect())
    }

    async fn search_products(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data();
        data.check_available()?;
        let needle = query.to_lowercase();
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(data
            .products
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

impl AccountStore for MemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let data = self.data();
        data.check_available()?;
        Ok(data.users.get(&id).cloned())
    }
}

impl OrderStore for MemoryStore {
    async fn get_or_create_customer(
        &self,
        customer: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let mut data = self.data();
        data.check_available()?;

        if let Some(existing) = data.customers.iter().find(|c| c.email == customer.email) {
            return Ok(existing.clone());
        }

        let id = i32::try_from(data.customers.len() + 1)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
        let created = Customer {
            id: CustomerId::new(id),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            phone: String::new(),
            email: customer.email.clone(),
            password: String::new(),
        };
        data.customers.push(created.clone());
        Ok(created)
    }

    async fn create_orders(&self, orders: &[NewOrder]) -> Result<Vec<Order>, RepositoryError> {
        let mut data = self.data();
        data.check_available()?;

        if data.order_writes_failing {
            return Err(RepositoryError::Unavailable("order writes failing".to_owned()));
        }

        let mut created = Vec::with_capacity(orders.len());
        for order in orders {
            if !data.products.contains_key(&order.product_id) {
                continue;
            }

            let fail_now = match data.order_write_countdown {
                Some(1) => {
                    data.order_write_countdown = None;
                    true
                }
                Some(n) => {
                    data.order_write_countdown = Some(n - 1);
                    false
                }
                None => false,
            };
            if fail_now {
                return Err(RepositoryError::Unavailable("order write failed".to_owned()));
            }

            let id = i32::try_from(data.orders.len() + created.len() + 1)
                .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
            created.push(Order {
                id: OrderId::new(id),
                product_id: order.product_id,
                customer_id: order.customer_id,
                quantity: order.quantity,
                unit_price: order.unit_price,
                address: order.address.clone(),
                phone: order.phone.clone(),
                status: true,
                created_at: Utc::now(),
            });
        }

        data.orders.extend(created.iter().cloned());
        Ok(created)
    }
}

impl NotificationLedger for MemoryStore {
    async fn claim_transaction(&self, txn_id: &str) -> Result<bool, RepositoryError> {
        let mut data = self.data();
        data.check_available()?;

        let now = Utc::now();
        if let Some(record) = data.notifications.get_mut(txn_id) {
            let timeout = TimeDelta::from_std(CLAIM_TIMEOUT).unwrap_or(TimeDelta::MAX);
            let stale = record.outcome == OUTCOME_PROCESSING
                && now.signed_duration_since(record.received_at) > timeout;
            if stale {
                record.received_at = now;
            }
            return Ok(stale);
        }

        data.notifications.insert(
            txn_id.to_owned(),
            NotificationRecord {
                txn_id: txn_id.to_owned(),
                outcome: OUTCOME_PROCESSING.to_owned(),
                orders_created: 0,
                received_at: now,
            },
        );
        Ok(true)
    }

    async fn release_transaction(&self, txn_id: &str) -> Result<(), RepositoryError> {
        let mut data = self.data();
        data.check_available()?;

        if data
            .notifications
            .get(txn_id)
            .is_some_and(|r| r.outcome == OUTCOME_PROCESSING)
        {
            data.notifications.remove(txn_id);
        }
        Ok(())
    }

    async fn finish_transaction(
        &self,
        txn_id: &str,
        outcome: &str,
        orders_created: i32,
    ) -> Result<(), RepositoryError> {
        let mut data = self.data();
        data.check_available()?;

        if let Some(record) = data.notifications.get_mut(txn_id) {
            outcome.clone_into(&mut record.outcome);
            record.orders_created = orders_created;
        }
        Ok(())
    }
}
