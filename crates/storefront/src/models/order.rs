//! Order lines written by the materializer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use peoplecart_core::{CustomerId, OrderId, ProductId};

/// One purchased product for one customer.
///
/// A checkout with several products becomes several orders. Nothing groups
/// them besides the customer and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub quantity: i32,
    /// Unit price applied when the order was materialized.
    pub unit_price: Decimal,
    pub address: String,
    pub phone: String,
    /// Paid flag. Materialized orders are always paid.
    pub status: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub address: String,
    pub phone: String,
}
