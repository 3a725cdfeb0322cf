//! Domain models for storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod customer;
pub mod order;
pub mod session;
pub mod user;

pub use customer::{Customer, NewCustomer};
pub use order::{NewOrder, Order};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
