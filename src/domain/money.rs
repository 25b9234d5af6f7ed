//! Monetary types for price and volume representation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Volume represented as a Decimal for precision.
pub type Volume = Decimal;

/// Rounding rules the ledger applies to order prices and amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OrderConstraints {
    /// Decimal places kept on prices.
    #[serde(default = "default_precision")]
    pub price_precision: u32,
    /// Decimal places kept on amounts.
    #[serde(default = "default_precision")]
    pub amount_precision: u32,
    /// Smallest amount worth placing; anything below is treated as zero.
    #[serde(default)]
    pub min_amount: Volume,
}

const fn default_precision() -> u32 {
    7
}

impl OrderConstraints {
    pub fn round_price(&self, price: Price) -> Price {
        price.round_dp_with_strategy(self.price_precision, RoundingStrategy::MidpointNearestEven)
    }

    /// Amounts are truncated so a rounded order never exceeds the balance it was capped at.
    pub fn round_amount(&self, amount: Volume) -> Volume {
        amount.round_dp_with_strategy(self.amount_precision, RoundingStrategy::ToZero)
    }

    /// Round the amount and zero it out when it falls below `min_amount`.
    pub fn placeable_amount(&self, amount: Volume) -> Volume {
        let rounded = self.round_amount(amount);
        if rounded <= Decimal::ZERO || rounded < self.min_amount {
            Decimal::ZERO
        } else {
            rounded
        }
    }
}

impl Default for OrderConstraints {
    fn default() -> Self {
        Self {
            price_precision: default_precision(),
            amount_precision: default_precision(),
            min_amount: Decimal::ZERO,
        }
    }
}
