//! Customer and order writes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use peoplecart_core::{CustomerId, Email, OrderId, ProductId};

use super::{OrderStore, PgStore, RepositoryError};
use crate::models::{Customer, NewCustomer, NewOrder, Order};

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    first_name: String,
    last_name: String,
    phone: String,
    email: String,
    password: String,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            email,
            password: row.password,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    product_id: i32,
    customer_id: i32,
    quantity: i32,
    unit_price: Decimal,
    address: String,
    phone: String,
    status: bool,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            product_id: ProductId::new(row.product_id),
            customer_id: CustomerId::new(row.customer_id),
            quantity: row.quantity,
            unit_price: row.unit_price,
            address: row.address,
            phone: row.phone,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

impl OrderStore for PgStore {
    /// The no-op update on conflict makes `RETURNING` yield the existing row,
    /// so concurrent first purchases for one email share a single customer.
    #[instrument(skip(self, customer), fields(email = %customer.email))]
    async fn get_or_create_customer(
        &self,
        customer: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO storefront.customer (first_name, last_name, phone, email, password)
            VALUES ($1, $2, '', $3, '')
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, first_name, last_name, phone, email, password
            ",
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.email.as_str())
        .fetch_one(self.pool())
        .await?;

        Customer::try_from(row)
    }

    /// Runs in one transaction. The `INSERT ... SELECT` yields no row for a
    /// product deleted since pricing, which leaves that line out.
    #[instrument(skip(self, orders), fields(lines = orders.len()))]
    async fn create_orders(&self, orders: &[NewOrder]) -> Result<Vec<Order>, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        let mut created = Vec::with_capacity(orders.len());

        for order in orders {
            let row = sqlx::query_as::<_, OrderRow>(
                r"
                INSERT INTO storefront.order_line
                    (product_id, customer_id, quantity, unit_price, address, phone, status)
                SELECT p.id, $2, $3, $4, $5, $6, TRUE
                FROM storefront.product p
                WHERE p.id = $1
                RETURNING id, product_id, customer_id, quantity, unit_price,
                          address, phone, status, created_at
                ",
            )
            .bind(order.product_id.as_i32())
            .bind(order.customer_id.as_i32())
            .bind(order.quantity)
            .bind(order.unit_price)
            .bind(&order.address)
            .bind(&order.phone)
            .fetch_optional(&mut *tx)
            .await?;

            match row {
                Some(row) => created.push(Order::from(row)),
                None => tracing::warn!(product_id = %order.product_id, "Product vanished before order insert"),
            }
        }

        tx.commit().await?;
        Ok(created)
    }
}
