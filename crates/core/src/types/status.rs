//! Payment status reported by the processor.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Final status of a payment as reported in a processor notification.
///
/// Only [`PaymentStatus::Completed`] can lead to orders. Every other value,
/// including ones this enum does not know about, halts processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Completed,
    Pending,
    Denied,
    Failed,
    Expired,
    Refunded,
    Reversed,
    Voided,
    CanceledReversal,
    /// A status string the processor sent that we do not recognize.
    Other(String),
}

impl PaymentStatus {
    /// Parse the processor's status string (case-sensitive, as sent).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Completed" => Self::Completed,
            "Pending" => Self::Pending,
            "Denied" => Self::Denied,
            "Failed" => Self::Failed,
            "Expired" => Self::Expired,
            "Refunded" => Self::Refunded,
            "Reversed" => Self::Reversed,
            "Voided" => Self::Voided,
            "Canceled_Reversal" => Self::CanceledReversal,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Whether this status settles the payment.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The processor's spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Denied => "Denied",
            Self::Failed => "Failed",
            Self::Expired => "Expired",
            Self::Refunded => "Refunded",
            Self::Reversed => "Reversed",
            Self::Voided => "Voided",
            Self::CanceledReversal => "Canceled_Reversal",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_completed_is_completed() {
        assert!(PaymentStatus::parse("Completed").is_completed());
        assert!(!PaymentStatus::parse("completed").is_completed());
        assert!(!PaymentStatus::parse("Pending").is_completed());
        assert!(!PaymentStatus::parse("").is_completed());
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status = PaymentStatus::parse("In-Progress");
        assert_eq!(status, PaymentStatus::Other("In-Progress".to_owned()));
        assert_eq!(status.to_string(), "In-Progress");
    }

    #[test]
    fn test_canceled_reversal_spelling() {
        assert_eq!(
            PaymentStatus::parse("Canceled_Reversal"),
            PaymentStatus::CanceledReversal
        );
        assert_eq!(PaymentStatus::CanceledReversal.as_str(), "Canceled_Reversal");
    }
}
