//! Paper trading configuration: starting balances and a static remote book.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::adapter::{PaperLedger, StaticExchange};
use crate::domain::{AccountId, Asset, Balance, Price, Volume};
use crate::error::ConfigError;
use crate::port::{BookLevel, OrderBook};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaperConfig {
    /// Starting sequence number of the account.
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub balances: Vec<PaperBalance>,
    /// Book served to mirror strategies and book-based feeds.
    #[serde(default)]
    pub book: Option<PaperBook>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaperBalance {
    pub asset: Asset,
    pub amount: Volume,
    /// Required for credit assets.
    #[serde(default)]
    pub trust_limit: Option<Volume>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PaperBookLevel {
    pub price: Price,
    pub volume: Volume,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaperBook {
    #[serde(default)]
    pub asks: Vec<PaperBookLevel>,
    #[serde(default)]
    pub bids: Vec<PaperBookLevel>,
}

impl PaperConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for balance in &self.balances {
            if balance.amount < Decimal::ZERO {
                return Err(ConfigError::invalid(
                    "paper.balances.amount",
                    format!("{} must not be negative", balance.amount),
                ));
            }
            if !balance.asset.is_native() && balance.trust_limit.is_none() {
                return Err(ConfigError::MissingField {
                    field: "paper.balances.trust_limit",
                });
            }
        }
        Ok(())
    }

    /// A paper ledger holding the configured balances.
    pub fn build_ledger(&self, account: AccountId) -> PaperLedger {
        let ledger = PaperLedger::new(account, self.sequence);
        for b in &self.balances {
            let balance = match b.trust_limit {
                Some(limit) if !b.asset.is_native() => Balance::credit(b.amount, limit),
                _ => Balance::native(b.amount),
            };
            ledger.set_balance(b.asset.clone(), balance);
        }
        ledger
    }

    /// The configured book as an exchange, if any.
    pub fn build_exchange(&self) -> Option<Arc<StaticExchange>> {
        let book = self.book.as_ref()?;
        let levels = |side: &[PaperBookLevel]| {
            side.iter()
                .map(|l| BookLevel::new(l.price, l.volume))
                .collect::<Vec<_>>()
        };
        Some(Arc::new(StaticExchange::new(OrderBook::new(
            levels(&book.asks),
            levels(&book.bids),
        ))))
    }
}
