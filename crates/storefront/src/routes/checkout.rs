//! Checkout route handlers.
//!
//! Checkout reprices the browser's cart, builds the processor payment request
//! and renders a page whose form posts straight to the processor. Nothing is
//! persisted here; orders are created when the processor confirms payment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use peoplecart_core::{IntentError, LineItem, Price, parse_client_cart};

use crate::error::{AppError, Result, add_breadcrumb, set_sentry_user};
use crate::middleware::{RequireAuth, set_flash};
use crate::services::{PaymentRequest, compute_cart};
use crate::state::AppState;

/// Shown when the cart holds nothing to buy.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty. Add some items before checkout.";
/// Shown when no cart line matches a product in the catalog.
pub const NO_VALID_ITEMS_MESSAGE: &str = "No valid items in cart.";
/// Shown when the cart cannot travel through the processor intact.
pub const CART_TOO_LARGE_MESSAGE: &str =
    "Your cart is too large to pay for at once. Remove some items and try again.";

/// Checkout query parameters.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    /// The browser's cart as JSON.
    #[serde(default)]
    pub cart: String,
}

/// A priced line as shown on the checkout page.
#[derive(Clone)]
pub struct CheckoutLineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&LineItem> for CheckoutLineView {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: Price::usd(item.unit_price).display(),
            line_total: Price::usd(item.line_total).display(),
        }
    }
}

/// Checkout summary and processor form.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/pay.html")]
pub struct CheckoutTemplate {
    pub store_name: String,
    pub items: Vec<CheckoutLineView>,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    /// Processor web checkout the form posts to.
    pub action: String,
    pub fields: Vec<(&'static str, String)>,
}

/// Processor return page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub store_name: String,
}

/// Processor cancel page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/cancel.html")]
pub struct CheckoutCancelTemplate {
    pub store_name: String,
}

/// Send the buyer back to the cart with a message.
async fn back_to_cart(session: &Session, message: &str) -> Response {
    set_flash(session, message).await;
    Redirect::to("/cart").into_response()
}

/// Show the checkout page.
///
/// Empty, unreadable, or fully unresolvable carts redirect to the cart page
/// with a message.
#[instrument(skip(state, session, query), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response> {
    let lines = match parse_client_cart(&query.cart) {
        Ok(lines) => lines,
        Err(e) => {
            tracing::info!(error = %e, "unreadable cart at checkout");
            Vec::new()
        }
    };
    if lines.is_empty() {
        return Ok(back_to_cart(&session, EMPTY_CART_MESSAGE).await);
    }

    let Some(priced) = compute_cart(state.store(), &lines).await? else {
        return Ok(back_to_cart(&session, NO_VALID_ITEMS_MESSAGE).await);
    };

    let config = state.config();
    let request = match PaymentRequest::build(
        user.id,
        &lines,
        &priced,
        state.intent_signer(),
        &config.payment.receiver_email,
        &config.store_name,
        state.checkout_urls(),
    ) {
        Ok(request) => request,
        Err(e @ IntentError::TooLong { .. }) => {
            tracing::warn!(error = %e, lines = lines.len(), "cart too large for processor");
            return Ok(back_to_cart(&session, CART_TOO_LARGE_MESSAGE).await);
        }
        Err(e) => return Err(AppError::Internal(format!("checkout intent: {e}"))),
    };

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb(
        "checkout",
        "payment request built",
        &[
            ("invoice", request.invoice.as_str()),
            ("amount", request.amount.as_str()),
        ],
    );
    tracing::info!(
        invoice = %request.invoice,
        amount = %request.amount,
        items = priced.item_count(),
        "checkout ready"
    );

    Ok(CheckoutTemplate {
        store_name: config.store_name.clone(),
        items: priced.line_items.iter().map(CheckoutLineView::from).collect(),
        subtotal: Price::usd(priced.subtotal).display(),
        tax: Price::usd(priced.tax).display(),
        total: priced.total_price().display(),
        action: config.payment.checkout_url.to_string(),
        fields: request.form_fields(),
    }
    .into_response())
}

/// Processor return page.
///
/// Payment may still be pending here; orders appear once the processor's
/// notification arrives.
#[instrument(skip(state))]
pub async fn success(State(state): State<AppState>) -> CheckoutSuccessTemplate {
    CheckoutSuccessTemplate {
        store_name: state.config().store_name.clone(),
    }
}

/// Processor cancel page.
#[instrument(skip(state))]
pub async fn cancel(State(state): State<AppState>) -> CheckoutCancelTemplate {
    CheckoutCancelTemplate {
        store_name: state.config().store_name.clone(),
    }
}
