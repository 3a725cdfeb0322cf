//! Business logic services for storefront.
//!
//! # Services
//!
//! - `pricing` - Reprice a client cart from live catalog data
//! - `checkout` - Build the payment request handed to the processor
//! - `payments` - Notification parsing and processor re-verification
//! - `materializer` - Turn a paid intent into customer and order rows
//! - `listener` - Drive one payment notification to a terminal outcome

pub mod checkout;
pub mod listener;
pub mod materializer;
pub mod payments;
pub mod pricing;

pub use checkout::{CheckoutUrls, PaymentRequest};
pub use listener::{ListenerOutcome, PaymentListener};
pub use materializer::{MaterializeError, MaterializeReport, MaterializeRequest, materialize};
pub use payments::{IpnVerifier, PaymentNotification, PaymentVerifier, Verification};
pub use pricing::compute_cart;
