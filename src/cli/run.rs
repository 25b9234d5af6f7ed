//! Handler for the `run` command.

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use crate::bot::build_bot;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::port::{ExchangeClient, LedgerClient};

/// Apply command-line overrides to a loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if args.dry_run {
        config.bot.dry_run = true;
    }
    if let Some(ticks) = args.ticks {
        config.bot.settings.iterations = Some(ticks);
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
}

/// Execute the run command against the paper ledger.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args);

    config.init_logging();

    let account = config.account_id()?;
    let ledger: Arc<dyn LedgerClient> = Arc::new(config.paper.build_ledger(account));
    let exchange = config
        .paper
        .build_exchange()
        .map(|e| e as Arc<dyn ExchangeClient>);

    let mut bot = build_bot(&config, ledger, exchange)?;

    info!(
        pair = %config.pair,
        strategy = config.strategy.kind.name(),
        dry_run = config.bot.dry_run,
        "tidemark starting"
    );

    tokio::select! {
        result = bot.run() => {
            if let Err(e) = result {
                error!(error = %e, "Fatal error");
                return Err(e);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!(ticks = bot.ticks(), "tidemark stopped");
    Ok(())
}
