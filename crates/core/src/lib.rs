//! PeopleCart Core - Domain types and checkout pricing.
//!
//! This crate provides the types shared by all PeopleCart components:
//! - `storefront` - Public bookstore site and payment notification endpoint
//! - `cli` - Command-line tools for migrations and sample data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that decides what a checkout costs and
//! what travels through the payment processor lives here so it can be tested
//! without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`catalog`] - Products and categories as read from the catalog
//! - [`cart`] - Client-held cart lines and their lenient parsing
//! - [`pricing`] - Authoritative cart pricing (subtotal, flat tax, total)
//! - [`intent`] - The signed checkout intent carried through the payment processor

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod intent;
pub mod pricing;
pub mod types;

pub use cart::{CartError, CartLine, parse_client_cart};
pub use catalog::{Category, Product};
pub use intent::{
    CUSTOM_FIELD_MAX_LEN, CheckoutIntent, IntentError, IntentSigner, SealError, SealedIntent,
};
pub use pricing::{LineItem, PricedCart, TAX_RATE, price_cart};
pub use types::*;
