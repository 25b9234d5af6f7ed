//! Assembles a [`Bot`] from configuration.

use std::sync::Arc;

use tracing::info;

use super::Bot;
use crate::config::Config;
use crate::error::Result;
use crate::ledger::{SequenceManager, Submitter};
use crate::port::{ExchangeClient, LedgerClient};
use crate::risk::{CapacityGuard, ExposureTracker};
use crate::strategy::{build_strategy, StrategyContext};

/// Build a bot trading through `ledger`.
///
/// `exchange` serves mirror strategies and book-based feeds.
pub fn build_bot(
    config: &Config,
    ledger: Arc<dyn LedgerClient>,
    exchange: Option<Arc<dyn ExchangeClient>>,
) -> Result<Bot> {
    let account = config.account_id()?;

    let exposure = Arc::new(ExposureTracker::new(ledger.clone(), account.clone()));
    let guard = Arc::new(CapacityGuard::new(exposure, config.risk)?);

    let feed = config
        .feed
        .as_ref()
        .map(|f| f.build(exchange.as_ref()))
        .transpose()?;
    let strategy = build_strategy(
        &config.strategy,
        &StrategyContext {
            pair: config.pair.clone(),
            guard: guard.clone(),
            feed,
            exchange,
            seed: None,
        },
    )?;

    let sequence = Arc::new(SequenceManager::new(ledger.clone(), account.clone()));
    let submitter = Submitter::new(sequence)
        .with_max_ops_per_tx(config.bot.max_ops_per_tx)
        .with_dry_run(config.bot.dry_run);

    info!(
        account = %account,
        pair = %config.pair,
        strategy = strategy.name(),
        max_ops_per_tx = config.bot.max_ops_per_tx,
        "Bot assembled"
    );
    Ok(Bot::new(
        account,
        config.pair.clone(),
        ledger,
        strategy,
        guard,
        submitter,
        config.bot.settings.clone(),
    ))
}
