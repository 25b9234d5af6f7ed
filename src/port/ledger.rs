//! Ledger port for account state and transaction submission.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{AccountId, Asset, Balance, LiveOrder, Mutation, PairBalances, TradingPair, TxHash};
use crate::error::LedgerError;

/// Account state as loaded from the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Balance per asset held or trusted by the account.
    pub balances: HashMap<Asset, Balance>,
    /// Number of ledger entries owned by the account (trustlines, offers, ...).
    pub subentry_count: u32,
}

impl AccountSnapshot {
    pub fn new(balances: HashMap<Asset, Balance>, subentry_count: u32) -> Self {
        Self {
            balances,
            subentry_count,
        }
    }

    /// Balance of an asset; assets without an entry read as empty.
    pub fn balance(&self, asset: &Asset) -> Balance {
        self.balances.get(asset).copied().unwrap_or_else(|| {
            if asset.is_native() {
                Balance::empty()
            } else {
                Balance::credit(Decimal::ZERO, Decimal::ZERO)
            }
        })
    }

    /// Balances of both assets of a pair.
    pub fn pair_balances(&self, pair: &TradingPair) -> PairBalances {
        PairBalances::new(self.balance(&pair.base), self.balance(&pair.quote))
    }

    /// Native asset balance.
    pub fn native_balance(&self) -> Decimal {
        self.balance(&Asset::Native).available
    }
}

/// A batch of mutations submitted atomically under one sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source: AccountId,
    pub sequence: u64,
    pub operations: Vec<Mutation>,
}

/// Client for the ledger hosting the order book.
///
/// Timeouts and retries on individual calls are the implementation's concern.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Load balances and the subentry count of an account.
    async fn load_account(&self, account: &AccountId) -> Result<AccountSnapshot, LedgerError>;

    /// Load the account's current sequence number.
    async fn load_sequence(&self, account: &AccountId) -> Result<u64, LedgerError>;

    /// Load every order resting for the account. Pagination is handled internally.
    async fn load_orders(&self, account: &AccountId) -> Result<Vec<LiveOrder>, LedgerError>;

    /// Submit a transaction.
    ///
    /// Returns [`LedgerError::StaleSequence`] when the sequence number does not
    /// follow the account's current one.
    async fn submit_transaction(&self, transaction: &Transaction) -> Result<TxHash, LedgerError>;

    /// Get the ledger name for logging/debugging.
    fn ledger_name(&self) -> &'static str;
}
