//! Customer records created from paid checkouts.

use peoplecart_core::{CustomerId, Email};

/// A customer (domain type).
///
/// One row per email. Phone and password stay empty when the record is
/// created by a payment; the address and phone from the processor live on
/// each order instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Email,
    /// Unused placeholder, always blank for payment-created customers.
    pub password: String,
}

/// Fields for get-or-create by email.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
}
