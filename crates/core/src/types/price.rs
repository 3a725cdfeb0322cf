//! Type-safe price representation using decimal arithmetic.
//!
//! All money in PeopleCart is a [`Decimal`]. Binary floating point never
//! touches a price: catalog prices come out of `NUMERIC` columns, cart totals
//! are exact sums, and the only rounding happens when an amount is handed to
//! the payment processor (see [`Price::charge_amount`]).

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places the payment processor accepts for a charge.
pub const CHARGE_DECIMAL_PLACES: u32 = 2;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a USD price.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self {
            amount,
            currency_code: CurrencyCode::USD,
        }
    }

    /// The amount rounded to what the processor can charge.
    ///
    /// Rounds to two decimal places, midpoint away from zero, so a computed
    /// total of `32.978` is charged as `32.98` and `10.005` as `10.01`.
    #[must_use]
    pub fn charge_amount(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(CHARGE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.charge_amount())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
///
/// The store settles in a single currency; the enum exists so the code that
/// reaches the processor is spelled in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
}

impl CurrencyCode {
    /// The ISO 4217 code sent to the processor.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::USD => "USD",
        }
    }

    /// The display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}
