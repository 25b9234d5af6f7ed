//! Fixed spreads around an external center price.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::{check_fraction, LevelProvider};
use crate::domain::{Level, Side, Volume};
use crate::error::{ConfigError, Result, SignalError};
use crate::port::PriceFeed;

/// One configured level: distance from the center and share of the base size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StaticLevel {
    /// Fractional distance from the center price, in `[0, 1]`.
    pub spread: Decimal,
    /// Fraction of the configured base size placed at this level.
    pub amount: Decimal,
}

impl StaticLevel {
    pub const fn new(spread: Decimal, amount: Decimal) -> Self {
        Self { spread, amount }
    }
}

/// Places `price = center * (1 ± spread)` and `amount = fraction * base size`.
pub struct StaticSpreadProvider {
    levels: Vec<StaticLevel>,
    amount_of_base: Volume,
    offset_percent: Decimal,
    side: Side,
    feed: Arc<dyn PriceFeed>,
}

impl std::fmt::Debug for StaticSpreadProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSpreadProvider")
            .field("levels", &self.levels)
            .field("amount_of_base", &self.amount_of_base)
            .field("offset_percent", &self.offset_percent)
            .field("side", &self.side)
            .field("feed", &self.feed.name())
            .finish()
    }
}

impl StaticSpreadProvider {
    /// Create a provider, rejecting spreads outside `[0, 1]` and negative sizes.
    pub fn new(
        levels: Vec<StaticLevel>,
        amount_of_base: Volume,
        side: Side,
        feed: Arc<dyn PriceFeed>,
    ) -> std::result::Result<Self, ConfigError> {
        for level in &levels {
            check_fraction("levels.spread", level.spread)?;
            if level.amount < Decimal::ZERO {
                return Err(ConfigError::invalid(
                    "levels.amount",
                    format!("{} must not be negative", level.amount),
                ));
            }
        }
        if amount_of_base < Decimal::ZERO {
            return Err(ConfigError::invalid(
                "amount_of_base",
                format!("{amount_of_base} must not be negative"),
            ));
        }
        Ok(Self {
            levels,
            amount_of_base,
            offset_percent: Decimal::ZERO,
            side,
            feed,
        })
    }

    /// Shift the center price by a fraction before spreads are applied.
    pub fn with_offset(mut self, offset_percent: Decimal) -> std::result::Result<Self, ConfigError> {
        if offset_percent <= -Decimal::ONE || offset_percent >= Decimal::ONE {
            return Err(ConfigError::invalid(
                "offset_percent",
                format!("{offset_percent} must be within (-1, 1)"),
            ));
        }
        self.offset_percent = offset_percent;
        Ok(self)
    }

    fn level_price(&self, center: Decimal, spread: Decimal) -> Decimal {
        match self.side {
            Side::Sell => center * (Decimal::ONE + spread),
            Side::Buy => center * (Decimal::ONE - spread),
        }
    }
}

#[async_trait]
impl LevelProvider for StaticSpreadProvider {
    async fn get_levels(&self, _max_base: Volume, _max_quote: Volume) -> Result<Vec<Level>> {
        if self.levels.is_empty() {
            return Ok(Vec::new());
        }

        let price = self.feed.get_price().await?;
        if price <= Decimal::ZERO {
            return Err(SignalError::InvalidPrice { price }.into());
        }
        let center = price * (Decimal::ONE + self.offset_percent);
        debug!(side = %self.side, feed = self.feed.name(), %center, "Static center price");

        Ok(self
            .levels
            .iter()
            .map(|l| Level::new(self.level_price(center, l.spread), l.amount * self.amount_of_base))
            .collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
