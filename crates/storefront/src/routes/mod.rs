//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database ping)
//!
//! # Catalog (JSON)
//! GET  /api/products                    - All products
//! GET  /api/products/{id}               - Single product
//! GET  /api/categories/{name}/products  - Products in a category
//! GET  /api/search?q=                   - Name/description search
//!
//! # Cart
//! GET  /cart                            - Cart page (cart lives in the browser)
//! POST /api/cart/price                  - Server-side pricing of a client cart
//!
//! # Checkout (requires auth)
//! GET  /checkout?cart=[...]             - Priced summary + processor form
//! GET  /checkout/success                - Processor return page
//! GET  /checkout/cancel                 - Processor cancel page
//!
//! # Payment processor
//! POST /payments/notify                 - Payment notification (always 200)
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payments;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the catalog API router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::show_product))
        .route("/categories/{name}/products", get(catalog::category_products))
        .route("/search", get(catalog::search))
}

/// Create all session-aware routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api", catalog_routes())
        .route("/api/cart/price", post(cart::price))
        .route("/cart", get(cart::show))
        .route("/checkout", get(checkout::show))
        .route("/checkout/success", get(checkout::success))
        .route("/checkout/cancel", get(checkout::cancel))
}

/// Routes called by the payment processor.
///
/// Mounted outside the session layer.
pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/payments/notify", post(payments::notify))
}
