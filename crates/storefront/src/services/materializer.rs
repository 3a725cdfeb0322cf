//! Order materialization.
//!
//! Runs only for a verified, completed payment. Resolves the customer by
//! email, then writes one paid order per cart line whose product still
//! exists. A bad line is skipped and the rest of the batch continues; only a
//! store failure aborts the call, and then no order from the batch is kept.

use thiserror::Error;
use tracing::instrument;

use peoplecart_core::{CartLine, CustomerId, Email};

use crate::db::{CatalogStore, OrderStore, RepositoryError};
use crate::models::{NewCustomer, NewOrder};

/// Errors that abort a materialization.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The store failed while resolving the customer or writing orders.
    #[error("store failure during materialization: {0}")]
    Store(#[from] RepositoryError),
}

/// Everything needed to commit a paid checkout.
#[derive(Debug, Clone)]
pub struct MaterializeRequest {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub lines: Vec<CartLine>,
    /// Shipping address reported by the processor.
    pub address: String,
    /// Contact phone reported by the processor.
    pub phone: String,
}

/// What a materialization did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeReport {
    pub customer_id: CustomerId,
    pub orders_created: usize,
    /// Lines dropped because their product no longer resolves.
    pub lines_skipped: usize,
}

/// Commit the orders for a paid checkout.
///
/// # Errors
///
/// Returns [`MaterializeError::Store`] on infrastructure failure. The
/// customer may already exist by then; no order has been written.
#[instrument(skip(store, request), fields(email = %request.email, lines = request.lines.len()))]
pub async fn materialize<S>(
    store: &S,
    request: &MaterializeRequest,
) -> Result<MaterializeReport, MaterializeError>
where
    S: CatalogStore + OrderStore,
{
    let customer = store
        .get_or_create_customer(&NewCustomer {
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
        })
        .await?;

    let mut orders = Vec::with_capacity(request.lines.len());
    let mut lines_skipped = 0;

    for line in &request.lines {
        let Some(product) = store.get_product(line.id).await? else {
            tracing::warn!(product_id = %line.id, "Skipping line for unknown product");
            lines_skipped += 1;
            continue;
        };

        let Ok(quantity) = i32::try_from(line.quantity) else {
            tracing::warn!(product_id = %line.id, quantity = line.quantity, "Skipping line with oversized quantity");
            lines_skipped += 1;
            continue;
        };

        orders.push(NewOrder {
            product_id: product.id,
            customer_id: customer.id,
            quantity,
            unit_price: product.unit_price(),
            address: request.address.clone(),
            phone: request.phone.clone(),
        });
    }

    let created = if orders.is_empty() {
        Vec::new()
    } else {
        store.create_orders(&orders).await?
    };
    // Products deleted between lookup and insert.
    lines_skipped += orders.len().saturating_sub(created.len());
    let orders_created = created.len();

    tracing::info!(
        customer_id = %customer.id,
        orders_created,
        lines_skipped,
        "Materialized paid checkout"
    );

    Ok(MaterializeReport {
        customer_id: customer.id,
        orders_created,
        lines_skipped,
    })
}
