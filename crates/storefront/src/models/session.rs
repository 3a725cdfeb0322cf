//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use peoplecart_core::{Email, UserId};

/// Session-stored user identity.
///
/// Written by the authentication layer at login. Checkout reads only the id;
/// the account itself is reloaded when a payment arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for a one-shot message shown on the next cart page render.
    pub const FLASH: &str = "flash";
}
