//! Exchange port for remote order books.

use async_trait::async_trait;

use crate::domain::{Price, Volume};
use crate::error::SignalError;

/// A single aggregated price level of a remote order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    /// The price at this level.
    pub price: Price,
    /// Total volume available at this price, in base units.
    pub volume: Volume,
}

impl BookLevel {
    pub const fn new(price: Price, volume: Volume) -> Self {
        Self { price, volume }
    }
}

/// Snapshot of a remote order book.
///
/// Asks are sorted ascending (best ask first), bids descending (best bid first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

impl OrderBook {
    /// Build a book, sorting both sides best-first.
    pub fn new(mut asks: Vec<BookLevel>, mut bids: Vec<BookLevel>) -> Self {
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        Self { asks, bids }
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }
}

/// Client for a remote exchange whose book is mirrored or used as a price signal.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch up to `depth` levels per side of `symbol`'s order book.
    async fn get_order_book(&self, symbol: &str, depth: usize) -> Result<OrderBook, SignalError>;

    /// Get the exchange name for logging/debugging.
    fn exchange_name(&self) -> &'static str;
}
