//! Target order levels.

use std::fmt;

use serde::Deserialize;

use super::{Price, Volume};

/// Side of the book a strategy or provider works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Offers bids: sells quote to buy base.
    Buy,
    /// Offers asks: sells base for quote.
    Sell,
}

impl Side {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single desired order, computed fresh each tick.
///
/// `price` is quote-per-base and `amount` is denominated in base, on both
/// sides of the book. Levels carry no identity across ticks: level `i` is
/// matched against live order `i` of the same side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub price: Price,
    pub amount: Volume,
}

impl Level {
    pub const fn new(price: Price, amount: Volume) -> Self {
        Self { price, amount }
    }
}
