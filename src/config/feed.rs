//! Price feed configuration.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::Price;
use crate::error::ConfigError;
use crate::feed::{BookPrice, CompositeFeed, FixedFeed, OrderBookFeed};
use crate::port::{ExchangeClient, PriceFeed};

/// Where the center price comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedConfig {
    Fixed {
        price: Price,
    },
    /// `numerator / denominator`.
    Composite {
        numerator: Box<FeedConfig>,
        denominator: Box<FeedConfig>,
    },
    /// Top of the paper exchange's book.
    Orderbook {
        symbol: String,
        #[serde(default)]
        price: BookPrice,
    },
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Fixed { price } if *price <= Decimal::ZERO => Err(ConfigError::invalid(
                "feed.price",
                format!("{price} must be positive"),
            )),
            Self::Fixed { .. } => Ok(()),
            Self::Composite {
                numerator,
                denominator,
            } => {
                numerator.validate()?;
                denominator.validate()
            }
            Self::Orderbook { symbol, .. } if symbol.trim().is_empty() => {
                Err(ConfigError::MissingField {
                    field: "feed.symbol",
                })
            }
            Self::Orderbook { .. } => Ok(()),
        }
    }

    /// Build the feed. Book-based feeds read from `exchange`.
    pub fn build(
        &self,
        exchange: Option<&Arc<dyn ExchangeClient>>,
    ) -> Result<Arc<dyn PriceFeed>, ConfigError> {
        let feed: Arc<dyn PriceFeed> = match self {
            Self::Fixed { price } => Arc::new(FixedFeed::new(*price)),
            Self::Composite {
                numerator,
                denominator,
            } => Arc::new(CompositeFeed::new(
                numerator.build(exchange)?,
                denominator.build(exchange)?,
            )),
            Self::Orderbook { symbol, price } => {
                let exchange = exchange.ok_or(ConfigError::MissingField {
                    field: "paper.book",
                })?;
                Arc::new(OrderBookFeed::new(exchange.clone(), symbol.clone(), *price))
            }
        };
        Ok(feed)
    }
}
