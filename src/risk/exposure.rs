//! Memoized estimate of what the account's resting orders commit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{AccountId, Asset, LiveOrder, Volume};
use crate::error::LedgerError;
use crate::port::LedgerClient;

/// Amounts committed by resting orders, per asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Liabilities {
    selling: HashMap<Asset, Volume>,
    buying: HashMap<Asset, Volume>,
}

impl Liabilities {
    /// Sum the liabilities of a set of orders.
    pub fn from_orders(orders: &[LiveOrder]) -> Self {
        let mut liabilities = Self::default();
        for order in orders {
            liabilities.add(&order.selling, order.amount, &order.buying, order.buying_amount());
        }
        liabilities
    }

    /// Amount of `asset` that would be sold if every order filled.
    pub fn selling(&self, asset: &Asset) -> Volume {
        self.selling.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Amount of `asset` that would be received if every order filled.
    pub fn buying(&self, asset: &Asset) -> Volume {
        self.buying.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    fn add(&mut self, selling: &Asset, selling_amount: Volume, buying: &Asset, buying_amount: Volume) {
        *self.selling.entry(selling.clone()).or_default() += selling_amount;
        *self.buying.entry(buying.clone()).or_default() += buying_amount;
    }

    fn merged(&self, pending: &Self) -> Self {
        let mut merged = self.clone();
        for (asset, amount) in &pending.selling {
            *merged.selling.entry(asset.clone()).or_default() += *amount;
        }
        for (asset, amount) in &pending.buying {
            *merged.buying.entry(asset.clone()).or_default() += *amount;
        }
        merged
    }
}

#[derive(Debug, Default)]
struct Cache {
    /// Liabilities of the orders resting when the cache was filled.
    loaded: Option<Liabilities>,
    /// Commitments approved since the last reset.
    pending: Liabilities,
}

/// Tracks the reserve asset at risk across *all* of the account's resting
/// orders, including those placed by other processes sharing the account.
///
/// The estimate is computed at most once between two calls to
/// [`reset_cache`](Self::reset_cache); the control loop resets it once per tick
/// before any sizing decision.
pub struct ExposureTracker {
    ledger: Arc<dyn LedgerClient>,
    account: AccountId,
    cache: Mutex<Cache>,
    loads: AtomicU64,
}

impl ExposureTracker {
    pub fn new(ledger: Arc<dyn LedgerClient>, account: AccountId) -> Self {
        Self {
            ledger,
            account,
            cache: Mutex::new(Cache::default()),
            loads: AtomicU64::new(0),
        }
    }

    /// Invalidate the estimate and drop pending commitments.
    pub async fn reset_cache(&self) {
        let mut cache = self.cache.lock().await;
        *cache = Cache::default();
    }

    /// Native asset committed by every resting order that sells it.
    pub async fn get_exposure(&self) -> Result<Volume, LedgerError> {
        Ok(self.liabilities().await?.selling(&Asset::Native))
    }

    /// Current liabilities snapshot including pending commitments.
    pub async fn liabilities(&self) -> Result<Liabilities, LedgerError> {
        let mut cache = self.cache.lock().await;
        if cache.loaded.is_none() {
            let orders = self.ledger.load_orders(&self.account).await?;
            let loaded = Liabilities::from_orders(&orders);
            self.loads.fetch_add(1, Ordering::Relaxed);
            debug!(
                orders = orders.len(),
                native_exposure = %loaded.selling(&Asset::Native),
                "Exposure recomputed"
            );
            cache.loaded = Some(loaded);
        }
        let loaded = cache.loaded.as_ref().map(|l| l.merged(&cache.pending));
        Ok(loaded.unwrap_or_default())
    }

    /// Record a change in commitment approved during the current tick.
    ///
    /// Deltas may be negative when an order shrinks or is deleted.
    pub async fn record(
        &self,
        selling: &Asset,
        selling_delta: Volume,
        buying: &Asset,
        buying_delta: Volume,
    ) {
        let mut cache = self.cache.lock().await;
        cache.pending.add(selling, selling_delta, buying, buying_delta);
    }

    /// Number of times the estimate was loaded from the ledger.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}
