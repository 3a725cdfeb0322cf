//! Typed view of a processor notification body.

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;

use peoplecart_core::PaymentStatus;

use super::Verification;

/// Errors that make a notification body unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// A required field is absent or blank.
    #[error("notification is missing {0}")]
    MissingField(&'static str),
}

/// A payment notification as sent by the processor.
///
/// Only `txn_id` and `payment_status` are required to read the notification.
/// Whether it can produce orders is decided later by the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    /// Processor transaction id, unique per payment.
    pub txn_id: String,
    pub payment_status: PaymentStatus,
    /// Sealed checkout intent echoed back verbatim. Empty when absent.
    pub custom: String,
    /// Merchant account the payment was sent to.
    pub receiver_email: Option<String>,
    pub payer_email: Option<String>,
    /// Amount charged, as reported by the processor.
    pub gross: Option<Decimal>,
    pub currency: Option<String>,
    /// Shipping street address. Empty when absent.
    pub address_street: String,
    /// Buyer contact phone. Empty when absent.
    pub contact_phone: String,
}

impl PaymentNotification {
    /// Parse a form-encoded notification body.
    ///
    /// When a field repeats, the first value wins. An unparsable `mc_gross`
    /// is treated as absent, which the listener refuses as unpaid.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::MissingField`] when `txn_id` or
    /// `payment_status` is absent or blank.
    pub fn from_form(body: &[u8]) -> Result<Self, NotificationError> {
        let mut fields: HashMap<String, String> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            fields.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }

        let mut take = |key: &str| {
            fields
                .remove(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let txn_id = take("txn_id").ok_or(NotificationError::MissingField("txn_id"))?;
        let payment_status = take("payment_status")
            .map(|s| PaymentStatus::parse(&s))
            .ok_or(NotificationError::MissingField("payment_status"))?;

        Ok(Self {
            txn_id,
            payment_status,
            custom: take("custom").unwrap_or_default(),
            receiver_email: take("receiver_email"),
            payer_email: take("payer_email"),
            gross: take("mc_gross").and_then(|v| v.parse().ok()),
            currency: take("mc_currency"),
            address_street: take("address_street").unwrap_or_default(),
            contact_phone: take("contact_phone").unwrap_or_default(),
        })
    }
}

/// What a notification means once the processor has vouched for it (or not).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Verified and completed: the only event that may create orders.
    Completed,
    /// Verified, but the payment has not settled.
    NotCompleted(PaymentStatus),
    /// The processor did not recognize the notification.
    Invalid,
}

impl PaymentEvent {
    /// Classify a notification given the processor's verification answer.
    #[must_use]
    pub fn classify(verification: Verification, status: &PaymentStatus) -> Self {
        match verification {
            Verification::Invalid => Self::Invalid,
            Verification::Verified if status.is_completed() => Self::Completed,
            Verification::Verified => Self::NotCompleted(status.clone()),
        }
    }
}
