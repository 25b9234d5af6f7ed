//! Builders for domain primitives used across tests.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::adapter::PaperLedger;
use crate::domain::{AccountId, Asset, Balance, LiveOrder, TradingPair};

/// Account id shared by test fixtures.
pub fn account() -> AccountId {
    AccountId::from("GTESTACCOUNT")
}

/// The credit asset `USD:GISSUER`.
pub fn usd() -> Asset {
    Asset::credit("USD", "GISSUER")
}

/// The pair `native/USD:GISSUER`.
pub fn pair() -> TradingPair {
    TradingPair::new(Asset::Native, usd())
}

/// A sell-side order of [`pair`]: sells native for USD at `price` quote-per-base.
pub fn ask(id: u64, price: Decimal, amount: Decimal) -> LiveOrder {
    LiveOrder::new(id, Asset::Native, usd(), price, amount)
}

/// A buy-side order of [`pair`] in offer terms: sells `amount` USD at `price` base-per-quote.
pub fn bid_offer(id: u64, price: Decimal, amount: Decimal) -> LiveOrder {
    LiveOrder::new(id, usd(), Asset::Native, price, amount)
}

/// A paper ledger for [`account`] holding `base` native and `quote` USD.
///
/// The USD trustline limit is large enough to never bind.
pub fn funded_ledger(base: Decimal, quote: Decimal) -> Arc<PaperLedger> {
    let ledger = PaperLedger::new(account(), 0);
    ledger.set_balance(Asset::Native, Balance::native(base));
    ledger.set_balance(usd(), Balance::credit(quote, Decimal::from(1_000_000_000u64)));
    Arc::new(ledger)
}
