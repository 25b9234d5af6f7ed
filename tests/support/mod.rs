//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal_macros::dec;
use tidemark::bot::{Bot, BotSettings};
use tidemark::ledger::{SequenceManager, Submitter, DEFAULT_MAX_OPS_PER_TX};
use tidemark::port::{LedgerClient, PriceFeed};
use tidemark::risk::{CapacityGuard, ExposureTracker, ReserveLimits};
use tidemark::strategy::{build_strategy, Strategy, StrategyConfig, StrategyContext};
use tidemark::testkit::domain::{account, pair};

/// Sell levels at 1% and 2% above the center, 50 and 30 base.
pub const SELL_ONLY: &str = r#"
kind = "sell"
price_tolerance = 0.005
amount_tolerance = 0.01
amount_of_base = 100
levels = [{ spread = 0.01, amount = 0.5 }, { spread = 0.02, amount = 0.3 }]
"#;

/// Two levels per side around the center.
pub const BUY_SELL: &str = r#"
kind = "buysell"
price_tolerance = 0.005
amount_tolerance = 0.01
amount_of_base = 100
sell_levels = [{ spread = 0.01, amount = 0.5 }, { spread = 0.02, amount = 0.3 }]
buy_levels = [{ spread = 0.01, amount = 0.1 }, { spread = 0.02, amount = 0.05 }]
"#;

/// Reserve limits with a buffer small enough to not bind in most tests.
pub fn loose_limits() -> ReserveLimits {
    ReserveLimits {
        base_reserve: dec!(0.5),
        operational_buffer: dec!(1),
        fractional_reserve_magnifier: dec!(1),
    }
}

pub fn guard(ledger: Arc<dyn LedgerClient>, limits: ReserveLimits) -> Arc<CapacityGuard> {
    let tracker = Arc::new(ExposureTracker::new(ledger, account()));
    Arc::new(CapacityGuard::new(tracker, limits).expect("valid limits"))
}

pub fn strategy(
    source: &str,
    guard: Arc<CapacityGuard>,
    feed: Arc<dyn PriceFeed>,
) -> Box<dyn Strategy> {
    let config: StrategyConfig = toml::from_str(source).expect("strategy config");
    build_strategy(
        &config,
        &StrategyContext {
            pair: pair(),
            guard,
            feed: Some(feed),
            exchange: None,
            seed: Some(1),
        },
    )
    .expect("strategy builds")
}

/// Assembles a bot over a ledger the way the binary does, with a test feed.
pub struct BotBuilder {
    ledger: Arc<dyn LedgerClient>,
    feed: Arc<dyn PriceFeed>,
    strategy: &'static str,
    limits: ReserveLimits,
    settings: BotSettings,
    max_ops_per_tx: usize,
    dry_run: bool,
}

impl BotBuilder {
    pub fn new(ledger: Arc<dyn LedgerClient>, feed: Arc<dyn PriceFeed>) -> Self {
        Self {
            ledger,
            feed,
            strategy: SELL_ONLY,
            limits: loose_limits(),
            settings: BotSettings::default(),
            max_ops_per_tx: DEFAULT_MAX_OPS_PER_TX,
            dry_run: false,
        }
    }

    pub fn strategy(mut self, source: &'static str) -> Self {
        self.strategy = source;
        self
    }

    pub fn limits(mut self, limits: ReserveLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn settings(mut self, settings: BotSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn max_ops_per_tx(mut self, max_ops_per_tx: usize) -> Self {
        self.max_ops_per_tx = max_ops_per_tx;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn build(self) -> Bot {
        let guard = guard(self.ledger.clone(), self.limits);
        let strategy = strategy(self.strategy, guard.clone(), self.feed);
        let sequence = Arc::new(SequenceManager::new(self.ledger.clone(), account()));
        Bot::new(
            account(),
            pair(),
            self.ledger,
            strategy,
            guard,
            Submitter::new(sequence)
                .with_max_ops_per_tx(self.max_ops_per_tx)
                .with_dry_run(self.dry_run),
            self.settings,
        )
    }
}
