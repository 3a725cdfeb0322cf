//! Cart route handlers.
//!
//! The cart lives in the browser (local storage). The server renders the page
//! with a catalog snapshot and prices carts on request; it never stores them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, body::Bytes, extract::State};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use peoplecart_core::{PricedCart, parse_client_cart};

use crate::db::CatalogStore;
use crate::error::{AppError, Result};
use crate::middleware::take_flash;
use crate::routes::catalog::ProductJson;
use crate::services::compute_cart;
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub store_name: String,
    /// Catalog snapshot for the client-side cart, safe to embed in a
    /// `<script>` element.
    pub catalog_json: String,
    pub flash: Option<String>,
}

/// Server-computed quote for a client cart.
#[derive(Debug, Serialize)]
pub struct CartQuote {
    #[serde(flatten)]
    pub cart: PricedCart,
    /// Total rounded to what would actually be charged.
    pub charge: String,
    pub item_count: u64,
}

impl From<PricedCart> for CartQuote {
    fn from(cart: PricedCart) -> Self {
        Self {
            charge: format!("{:.2}", cart.total_price().charge_amount()),
            item_count: cart.item_count(),
            cart,
        }
    }
}

/// Serialize the catalog for embedding in an inline JSON script element.
fn embeddable_json(products: &[ProductJson]) -> Result<String> {
    let json = serde_json::to_string(products)
        .map_err(|e| AppError::Internal(format!("catalog serialization: {e}")))?;
    Ok(json.replace('<', "\\u003c"))
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let products: Vec<ProductJson> = state
        .store()
        .list_products()
        .await?
        .into_iter()
        .map(ProductJson::from)
        .collect();

    Ok(CartShowTemplate {
        store_name: state.config().store_name.clone(),
        catalog_json: embeddable_json(&products)?,
        flash: take_flash(&session).await,
    })
}

/// Price a client cart.
///
/// The body is the browser's cart as JSON (`[{"id":1,"quantity":2}]`).
/// Responds with `null` when no line resolves to a product.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn price(State(state): State<AppState>, body: Bytes) -> Result<Json<Option<CartQuote>>> {
    let raw = std::str::from_utf8(&body)
        .map_err(|_| AppError::BadRequest("cart is not valid UTF-8".to_owned()))?;
    let lines = parse_client_cart(raw).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let priced = compute_cart(state.store(), &lines).await?;
    Ok(Json(priced.map(CartQuote::from)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use peoplecart_core::{CategoryId, LineItem, Product, ProductId};

    use super::*;

    #[test]
    fn test_embeddable_json_escapes_script_close() {
        let products = vec![ProductJson::from(Product {
            id: ProductId::new(1),
            name: "</script><b>".to_owned(),
            price: dec!(1.00),
            is_sale: false,
            sale_price: None,
            category_id: CategoryId::new(1),
            description: String::new(),
            image: None,
        })];

        let json = embeddable_json(&products).unwrap();
        assert!(!json.contains("</script>"));
        assert!(json.contains("\\u003c/script>"));
    }

    #[test]
    fn test_cart_quote_rounds_charge() {
        let quote = CartQuote::from(PricedCart {
            line_items: vec![LineItem {
                product_id: ProductId::new(1),
                name: "1984".to_owned(),
                quantity: 2,
                unit_price: dec!(14.99),
                line_total: dec!(29.98),
            }],
            subtotal: dec!(29.98),
            tax: dec!(2.998),
            total: dec!(32.978),
        });

        assert_eq!(quote.charge, "32.98");
        assert_eq!(quote.item_count, 2);
    }
}
