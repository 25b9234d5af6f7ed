//! Price feed implementations.
//!
//! - [`FixedFeed`] - a constant price
//! - [`CompositeFeed`] - cross rate of two feeds (numerator / denominator)
//! - [`OrderBookFeed`] - bid, ask or mid of a remote order book

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::Price;
use crate::error::SignalError;
use crate::port::{ExchangeClient, PriceFeed};

/// A feed that always returns the same price.
#[derive(Debug, Clone)]
pub struct FixedFeed {
    price: Price,
}

impl FixedFeed {
    pub const fn new(price: Price) -> Self {
        Self { price }
    }
}

#[async_trait]
impl PriceFeed for FixedFeed {
    async fn get_price(&self) -> Result<Price, SignalError> {
        Ok(self.price)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Cross rate of two feeds: `numerator / denominator`.
pub struct CompositeFeed {
    numerator: Arc<dyn PriceFeed>,
    denominator: Arc<dyn PriceFeed>,
    name: String,
}

impl CompositeFeed {
    pub fn new(numerator: Arc<dyn PriceFeed>, denominator: Arc<dyn PriceFeed>) -> Self {
        let name = format!("{}/{}", numerator.name(), denominator.name());
        Self {
            numerator,
            denominator,
            name,
        }
    }
}

#[async_trait]
impl PriceFeed for CompositeFeed {
    async fn get_price(&self) -> Result<Price, SignalError> {
        let numerator = self.numerator.get_price().await?;
        let denominator = self.denominator.get_price().await?;

        let price = numerator
            .checked_div(denominator)
            .ok_or_else(|| SignalError::Unavailable {
                source_name: self.name.clone(),
                reason: format!("cannot divide {numerator} by {denominator}"),
            })?;
        debug!(feed = %self.name, %numerator, %denominator, %price, "Composite price");
        Ok(price)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Which price of a remote book an [`OrderBookFeed`] reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookPrice {
    Bid,
    Ask,
    #[default]
    Mid,
}

/// Price taken from the top of a remote order book.
pub struct OrderBookFeed {
    exchange: Arc<dyn ExchangeClient>,
    symbol: String,
    mode: BookPrice,
}

impl OrderBookFeed {
    pub fn new(exchange: Arc<dyn ExchangeClient>, symbol: impl Into<String>, mode: BookPrice) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            mode,
        }
    }

    fn empty(&self, side: &'static str) -> SignalError {
        SignalError::EmptyBook {
            pair: self.symbol.clone(),
            side,
        }
    }
}

#[async_trait]
impl PriceFeed for OrderBookFeed {
    async fn get_price(&self) -> Result<Price, SignalError> {
        let book = self.exchange.get_order_book(&self.symbol, 1).await?;
        let bid = book.best_bid().map(|l| l.price);
        let ask = book.best_ask().map(|l| l.price);

        let price = match self.mode {
            BookPrice::Bid => bid.ok_or_else(|| self.empty("bid"))?,
            BookPrice::Ask => ask.ok_or_else(|| self.empty("ask"))?,
            BookPrice::Mid => {
                let bid = bid.ok_or_else(|| self.empty("bid"))?;
                let ask = ask.ok_or_else(|| self.empty("ask"))?;
                (bid + ask) / Decimal::TWO
            }
        };
        if price <= Decimal::ZERO {
            return Err(SignalError::InvalidPrice { price });
        }
        Ok(price)
    }

    fn name(&self) -> &str {
        self.exchange.exchange_name()
    }
}
