//! Configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. The account id may instead come
//! from the `TIDEMARK_ACCOUNT` environment variable, which takes precedence.

use std::path::Path;

use serde::Deserialize;

use crate::bot::BotSettings;
use crate::domain::{AccountId, TradingPair};
use crate::error::{ConfigError, Result};
use crate::ledger::DEFAULT_MAX_OPS_PER_TX;
use crate::risk::ReserveLimits;
use crate::strategy::{StrategyConfig, StrategyKind};

mod feed;
mod logging;
mod paper;

pub use feed::FeedConfig;
pub use logging::LoggingConfig;
pub use paper::{PaperBalance, PaperBook, PaperBookLevel, PaperConfig};

/// Environment variable holding the account id.
pub const ACCOUNT_ENV: &str = "TIDEMARK_ACCOUNT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotConfig {
    #[serde(flatten)]
    pub settings: BotSettings,
    /// Log mutations instead of submitting them.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_max_ops_per_tx")]
    pub max_ops_per_tx: usize,
}

const fn default_max_ops_per_tx() -> usize {
    DEFAULT_MAX_OPS_PER_TX
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            settings: BotSettings::default(),
            dry_run: false,
            max_ops_per_tx: default_max_ops_per_tx(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,
    pub pair: TradingPair,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub risk: ReserveLimits,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub feed: Option<FeedConfig>,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;

        if let Ok(id) = std::env::var(ACCOUNT_ENV) {
            config.account.id = Some(id);
        }

        config.validate()?;

        Ok(config)
    }

    /// Parse and validate configuration text without consulting the environment.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.account_id()?;
        if self.pair.base == self.pair.quote {
            return Err(ConfigError::invalid("pair", "base and quote must differ").into());
        }
        if self.bot.max_ops_per_tx == 0 {
            return Err(ConfigError::invalid("bot.max_ops_per_tx", "must be positive").into());
        }
        self.risk.validate()?;
        self.strategy.tolerances.validate()?;
        if let Some(feed) = &self.feed {
            feed.validate()?;
        }
        let needs_feed = matches!(
            self.strategy.kind,
            StrategyKind::BuySell(_) | StrategyKind::Sell(_)
        );
        if needs_feed && self.feed.is_none() {
            return Err(ConfigError::MissingField { field: "feed" }.into());
        }
        self.paper.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// The trading account.
    pub fn account_id(&self) -> std::result::Result<AccountId, ConfigError> {
        match self.account.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(AccountId::from(id)),
            _ => Err(ConfigError::MissingField { field: "account.id" }),
        }
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
