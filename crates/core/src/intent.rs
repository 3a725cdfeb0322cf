//! The checkout intent carried through the payment processor.
//!
//! At checkout the buyer's user id and cart lines are serialized into the
//! processor's free-form `custom` field. The processor echoes that field back
//! untouched on its payment notification, which makes it the only link between
//! a browser checkout and the orders created later.
//!
//! The intent itself is compact JSON:
//!
//! ```json
//! {"user_id":5,"cart_items":[{"id":1,"quantity":2}]}
//! ```
//!
//! The browser carries the form to the processor, so the field is sealed
//! before it leaves: [`IntentSigner::seal`] appends the charge and a
//! truncated HMAC-SHA256 tag over intent, charge, and currency.
//!
//! ```text
//! {"user_id":5,"cart_items":[{"id":1,"quantity":2}]}|32.98|9f2c...
//! ```
//!
//! Decoding is strict. Unknown fields, missing fields, or a line with a zero
//! quantity reject the whole intent; nothing is guessed.

use core::fmt;

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::cart::CartLine;
use crate::types::{CurrencyCode, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Longest value the processor stores in its `custom` field.
pub const CUSTOM_FIELD_MAX_LEN: usize = 256;

/// Bytes of the HMAC tag kept in a sealed intent.
const TAG_LEN: usize = 16;

const SEAL_SEPARATOR: char = '|';

/// Errors from encoding or decoding a [`CheckoutIntent`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum IntentError {
    /// No custom data came back with the notification.
    #[error("custom data is empty")]
    Empty,
    /// The custom data is not a well-formed intent.
    #[error("malformed checkout intent: {0}")]
    Malformed(String),
    /// A line carries a quantity below one.
    #[error("cart line for product {product_id} has invalid quantity {quantity}")]
    InvalidQuantity { product_id: i32, quantity: u32 },
    /// The sealed intent would not survive the processor's field limit.
    #[error("sealed intent is {len} characters, processor accepts at most {max}")]
    TooLong { len: usize, max: usize },
}

/// Errors from opening a sealed intent.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SealError {
    /// The signing key could not be used.
    #[error("intent signing key rejected")]
    InvalidKey,
    /// The custom data carries no charge or tag.
    #[error("custom data is not a sealed intent")]
    Unsealed,
    /// The tag does not match intent, charge, and currency.
    #[error("intent signature does not match")]
    BadSignature,
    /// The signed charge is not an amount.
    #[error("sealed charge is not an amount: {0}")]
    InvalidCharge(String),
    /// Authentic, but the intent inside does not decode.
    #[error(transparent)]
    Intent(#[from] IntentError),
}

/// A buyer's identity plus the cart lines they are paying for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutIntent {
    pub user_id: UserId,
    #[serde(rename = "cart_items")]
    pub lines: Vec<CartLine>,
}

impl CheckoutIntent {
    #[must_use]
    pub const fn new(user_id: UserId, lines: Vec<CartLine>) -> Self {
        Self { user_id, lines }
    }

    /// Serialize to the compact wire form.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::Malformed`] if serialization fails.
    pub fn encode(&self) -> Result<String, IntentError> {
        serde_json::to_string(self).map_err(|e| IntentError::Malformed(e.to_string()))
    }

    /// Parse the custom data echoed back by the processor.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError`] if the data is blank, is not an intent object,
    /// or contains a line with quantity zero.
    pub fn decode(raw: &str) -> Result<Self, IntentError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IntentError::Empty);
        }

        let intent: Self =
            serde_json::from_str(raw).map_err(|e| IntentError::Malformed(e.to_string()))?;

        if let Some(bad) = intent.lines.iter().find(|l| l.quantity == 0) {
            return Err(IntentError::InvalidQuantity {
                product_id: bad.id.as_i32(),
                quantity: bad.quantity,
            });
        }

        Ok(intent)
    }
}

/// An intent opened from a notification, with the charge it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedIntent {
    pub intent: CheckoutIntent,
    /// Amount the buyer was asked to pay at checkout.
    pub charge: Decimal,
}

/// Seals intents on the way out and opens them on the way back.
#[derive(Clone)]
pub struct IntentSigner {
    mac: HmacSha256,
    currency: CurrencyCode,
}

impl IntentSigner {
    /// Create a signer for one settlement currency.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidKey`] if the key cannot key an HMAC.
    pub fn new(key: &[u8], currency: CurrencyCode) -> Result<Self, SealError> {
        let mac = HmacSha256::new_from_slice(key).map_err(|_| SealError::InvalidKey)?;
        Ok(Self { mac, currency })
    }

    /// The currency every sealed charge is denominated in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    fn mac_for(&self, payload: &str, charge: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        for part in [payload, charge, self.currency.as_str()] {
            mac.update(part.as_bytes());
            mac.update(&[0]);
        }
        mac
    }

    /// Seal an intent together with the charge sent to the processor.
    ///
    /// A truncated intent would come back unreadable and the payment could
    /// never be matched to orders, so an oversized cart is refused up front.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError::TooLong`] when the sealed form exceeds
    /// [`CUSTOM_FIELD_MAX_LEN`].
    pub fn seal(&self, intent: &CheckoutIntent, charge: Decimal) -> Result<String, IntentError> {
        let payload = intent.encode()?;
        let charge = format!("{charge:.2}");
        let tag: Vec<u8> = self
            .mac_for(&payload, &charge)
            .finalize()
            .into_bytes()
            .into_iter()
            .take(TAG_LEN)
            .collect();

        let sealed = format!(
            "{payload}{SEAL_SEPARATOR}{charge}{SEAL_SEPARATOR}{}",
            hex::encode(tag)
        );
        if sealed.len() > CUSTOM_FIELD_MAX_LEN {
            return Err(IntentError::TooLong {
                len: sealed.len(),
                max: CUSTOM_FIELD_MAX_LEN,
            });
        }
        Ok(sealed)
    }

    /// Check the tag on echoed custom data, then decode the intent.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Intent`] only for custom data that carries a
    /// valid tag; every other variant means the data was not sealed here.
    pub fn open(&self, custom: &str) -> Result<SealedIntent, SealError> {
        let mut parts = custom.trim().rsplitn(3, SEAL_SEPARATOR);
        let (Some(tag), Some(charge), Some(payload)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SealError::Unsealed);
        };

        let tag = hex::decode(tag).map_err(|_| SealError::BadSignature)?;
        if tag.len() != TAG_LEN {
            return Err(SealError::BadSignature);
        }
        self.mac_for(payload, charge)
            .verify_truncated_left(&tag)
            .map_err(|_| SealError::BadSignature)?;

        let charge = charge
            .parse::<Decimal>()
            .map_err(|_| SealError::InvalidCharge(charge.to_owned()))?;
        let intent = CheckoutIntent::decode(payload)?;

        Ok(SealedIntent { intent, charge })
    }
}

impl fmt::Debug for IntentSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentSigner")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}
