//! Authoritative cart pricing.
//!
//! The browser's idea of what a cart costs is never used. Every checkout
//! reprices the cart from live catalog data here. Amounts stay at full decimal
//! precision; rounding to a chargeable amount is [`Price::charge_amount`]'s job.
//!
//! [`Price::charge_amount`]: crate::Price::charge_amount

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::CartLine;
use crate::catalog::Product;
use crate::types::{Price, ProductId};

/// Flat sales tax applied to every cart (10%).
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// A cart line that resolved to a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Result of pricing a cart with at least one resolvable line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl PricedCart {
    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.line_items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// The total as a chargeable USD price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::usd(self.total)
    }

    /// Short human-readable summary for the processor's item name field.
    ///
    /// Display only; nothing reads it back.
    #[must_use]
    pub fn description(&self, store_name: &str) -> String {
        match self.line_items.as_slice() {
            [only] if only.quantity == 1 => format!("{store_name}: {}", only.name),
            _ => format!("{store_name}: {} books", self.item_count()),
        }
    }
}

/// Price a cart against the catalog.
///
/// `lookup` resolves a product id to its current catalog entry. Lines whose id
/// does not resolve are skipped. Returns `None` when no line resolves, which
/// callers treat as an empty cart.
pub fn price_cart<'a, F>(lines: &[CartLine], lookup: F) -> Option<PricedCart>
where
    F: Fn(ProductId) -> Option<&'a Product>,
{
    let line_items: Vec<LineItem> = lines
        .iter()
        .filter_map(|line| {
            let product = lookup(line.id)?;
            let quantity = line.quantity.max(1);
            let unit_price = product.unit_price();
            Some(LineItem {
                product_id: product.id,
                name: product.name.clone(),
                quantity,
                unit_price,
                line_total: unit_price * Decimal::from(quantity),
            })
        })
        .collect();

    if line_items.is_empty() {
        return None;
    }

    let subtotal: Decimal = line_items.iter().map(|l| l.line_total).sum();
    let tax = subtotal * TAX_RATE;

    Some(PricedCart {
        line_items,
        subtotal,
        tax,
        total: subtotal + tax,
    })
}
