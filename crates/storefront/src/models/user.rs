//! Site account types.

use peoplecart_core::{Email, UserId};

/// A storefront account (domain type).
///
/// Accounts are managed by the authentication layer; checkout only reads
/// them to attribute a paid cart to a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Account email, the natural key for customer reconciliation.
    pub email: Email,
    /// Given name, possibly blank.
    pub first_name: String,
    /// Family name, possibly blank.
    pub last_name: String,
}

impl User {
    /// First name for customer records, falling back to the username when
    /// the account never filled one in.
    #[must_use]
    pub fn display_first_name(&self) -> &str {
        let first = self.first_name.trim();
        if first.is_empty() { &self.username } else { first }
    }
}
