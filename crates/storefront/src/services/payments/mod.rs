//! Payment processor notifications.
//!
//! The processor reports payment results by POSTing a form-encoded
//! notification. Nothing in it is trusted until the exact body has been
//! posted back to the processor and confirmed (see [`verify`]).

pub mod notification;
pub mod verify;

pub use notification::{NotificationError, PaymentEvent, PaymentNotification};
pub use verify::{IpnVerifier, PaymentVerifier, Verification, VerifyError};
