//! Levels copied from a remote exchange's order book.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::{check_fraction, LevelProvider};
use crate::domain::{Level, Side, Volume};
use crate::error::{ConfigError, Result};
use crate::port::ExchangeClient;

/// Parameters of a mirrored side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    /// Symbol of the remote book, in the exchange's notation.
    pub symbol: String,
    pub max_levels: usize,
    /// Remote volumes are divided by this before placing.
    #[serde(default = "default_divide_by")]
    pub volume_divide_by: Decimal,
    /// Extra distance applied to every mirrored price, away from the center.
    #[serde(default)]
    pub per_level_spread: Decimal,
}

fn default_divide_by() -> Decimal {
    Decimal::ONE
}

impl MirrorConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "symbol" });
        }
        if self.volume_divide_by <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "volume_divide_by",
                format!("{} must be positive", self.volume_divide_by),
            ));
        }
        check_fraction("per_level_spread", self.per_level_spread)
    }
}

/// Reads asks (sell side) or bids (buy side) off a remote book.
pub struct MirrorProvider {
    exchange: Arc<dyn ExchangeClient>,
    config: MirrorConfig,
    side: Side,
}

impl MirrorProvider {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        config: MirrorConfig,
        side: Side,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            exchange,
            config,
            side,
        })
    }
}

#[async_trait]
impl LevelProvider for MirrorProvider {
    async fn get_levels(&self, _max_base: Volume, _max_quote: Volume) -> Result<Vec<Level>> {
        if self.config.max_levels == 0 {
            return Ok(Vec::new());
        }

        let book = self
            .exchange
            .get_order_book(&self.config.symbol, self.config.max_levels)
            .await?;
        let (remote, factor) = match self.side {
            Side::Sell => (&book.asks, Decimal::ONE + self.config.per_level_spread),
            Side::Buy => (&book.bids, Decimal::ONE - self.config.per_level_spread),
        };

        let levels: Vec<Level> = remote
            .iter()
            .take(self.config.max_levels)
            .map(|l| Level::new(l.price * factor, l.volume / self.config.volume_divide_by))
            .collect();
        debug!(
            exchange = self.exchange.exchange_name(),
            symbol = %self.config.symbol,
            side = %self.side,
            levels = levels.len(),
            "Mirrored remote book"
        );
        Ok(levels)
    }

    fn name(&self) -> &'static str {
        "mirror"
    }
}
