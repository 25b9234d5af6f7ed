//! Handler for the `check` command.

use std::path::Path;

use crate::config::{Config, ACCOUNT_ENV};
use crate::error::Result;

/// Validate a configuration file without starting the bot.
pub fn execute<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;
    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!("  Account: {}", config.account_id()?);
    if std::env::var(ACCOUNT_ENV).is_ok() {
        println!("    (from {ACCOUNT_ENV})");
    }
    println!("  Pair: {}", config.pair);
    println!("  Strategy: {}", config.strategy.kind.name());
    println!(
        "  Tolerances: price {}, amount {}",
        config.strategy.tolerances.price, config.strategy.tolerances.amount
    );
    println!(
        "  Reserve: base {}, buffer {}, magnifier {}",
        config.risk.base_reserve,
        config.risk.operational_buffer,
        config.risk.fractional_reserve_magnifier
    );
    println!("  Tick interval: {}s", config.bot.settings.tick_interval_secs);
    println!("  Dry-run: {}", config.bot.dry_run);
    println!("  Paper balances: {}", config.paper.balances.len());
    println!();
    println!("Configuration is ready to use.");

    Ok(())
}
