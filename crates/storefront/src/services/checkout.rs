//! Payment request construction.
//!
//! Checkout never writes orders. It prices the cart, seals the buyer's intent
//! and the charge into the processor's `custom` field, and renders a form the browser posts
//! to the processor. Orders only appear once the processor reports back (see
//! [`crate::services::listener`]).

use url::Url;
use uuid::Uuid;

use peoplecart_core::{
    CartLine, CheckoutIntent, CurrencyCode, Email, IntentError, IntentSigner, PricedCart, UserId,
};

/// Processor command for a single-item "buy now" payment.
const CMD_XCLICK: &str = "_xclick";

/// Absolute, processor-reachable URLs attached to a payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    /// Where the processor posts its payment notification.
    pub notify: Url,
    /// Where the buyer lands after paying.
    pub success: Url,
    /// Where the buyer lands after abandoning payment.
    pub cancel: Url,
}

impl CheckoutUrls {
    /// Derive the checkout URLs from the storefront's public base URL.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if `base_url` is not an absolute URL.
    pub fn from_base(base_url: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?;
        Ok(Self {
            notify: base.join("/payments/notify")?,
            success: base.join("/checkout/success")?,
            cancel: base.join("/checkout/cancel")?,
        })
    }
}

/// The fields of an outgoing payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Merchant account receiving the payment.
    pub business: String,
    /// Charge amount, two decimals.
    pub amount: String,
    /// Display-only description.
    pub item_name: String,
    pub invoice: String,
    pub notify_url: String,
    pub return_url: String,
    pub cancel_return: String,
    /// Sealed [`CheckoutIntent`] and charge.
    pub custom: String,
    pub currency_code: CurrencyCode,
}

impl PaymentRequest {
    /// Build the request for a freshly priced cart.
    ///
    /// `priced` must come from pricing `lines` immediately before this call;
    /// its total becomes the charge, and is sealed alongside the intent.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::TooLong`] when the cart is too large to travel
    /// through the processor intact.
    pub fn build(
        user_id: UserId,
        lines: &[CartLine],
        priced: &PricedCart,
        signer: &IntentSigner,
        receiver: &Email,
        store_name: &str,
        urls: &CheckoutUrls,
    ) -> Result<Self, IntentError> {
        let charge = priced.total_price();
        let amount = charge.charge_amount();
        let custom = signer.seal(&CheckoutIntent::new(user_id, lines.to_vec()), amount)?;

        Ok(Self {
            business: receiver.as_str().to_owned(),
            amount: format!("{amount:.2}"),
            item_name: priced.description(store_name),
            invoice: invoice_id(user_id),
            notify_url: urls.notify.to_string(),
            return_url: urls.success.to_string(),
            cancel_return: urls.cancel.to_string(),
            custom,
            currency_code: charge.currency_code,
        })
    }

    /// Form fields in the processor's naming, in submission order.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("cmd", CMD_XCLICK.to_owned()),
            ("business", self.business.clone()),
            ("amount", self.amount.clone()),
            ("item_name", self.item_name.clone()),
            ("invoice", self.invoice.clone()),
            ("currency_code", self.currency_code.as_str().to_owned()),
            ("notify_url", self.notify_url.clone()),
            ("return", self.return_url.clone()),
            ("cancel_return", self.cancel_return.clone()),
            ("custom", self.custom.clone()),
        ]
    }
}

/// Invoice id shown to the buyer by the processor: `INV-{user}-{8 hex}`.
#[must_use]
pub fn invoice_id(user_id: UserId) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("INV-{user_id}-{suffix}")
}
