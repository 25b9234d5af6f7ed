//! Strategy configuration and construction.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::{ComposeStrategy, DeleteSideStrategy, LevelSideStrategy, SideStrategy, Strategy, Tolerances};
use crate::domain::{OrderConstraints, Side, TradingPair, Volume};
use crate::error::ConfigError;
use crate::level::{
    AutonomousConfig, AutonomousProvider, LevelProvider, MirrorConfig, MirrorProvider, StaticLevel,
    StaticSpreadProvider,
};
use crate::port::{ExchangeClient, PriceFeed};
use crate::risk::CapacityGuard;

/// Strategy section of the configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(flatten)]
    pub kind: StrategyKind,
    #[serde(flatten)]
    pub tolerances: Tolerances,
    #[serde(default)]
    pub constraints: OrderConstraints,
}

/// Which strategy to run, with its parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StrategyKind {
    /// Static spreads on both sides around a price feed.
    BuySell(BuySellConfig),
    /// Static spreads on the sell side; the buy side is emptied.
    Sell(SellConfig),
    /// Autonomous curve on both sides, driven by inventory.
    Balanced(AutonomousConfig),
    /// Both sides copied from a remote book.
    Mirror(MirrorConfig),
    /// Delete every order of the pair.
    Delete,
}

impl StrategyKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BuySell(_) => "buysell",
            Self::Sell(_) => "sell",
            Self::Balanced(_) => "balanced",
            Self::Mirror(_) => "mirror",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuySellConfig {
    /// Base size that level amount fractions are applied to.
    pub amount_of_base: Volume,
    #[serde(default)]
    pub offset_percent: Decimal,
    #[serde(default)]
    pub buy_levels: Vec<StaticLevel>,
    #[serde(default)]
    pub sell_levels: Vec<StaticLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SellConfig {
    pub amount_of_base: Volume,
    #[serde(default)]
    pub offset_percent: Decimal,
    pub levels: Vec<StaticLevel>,
}

/// Collaborators a strategy may need.
pub struct StrategyContext {
    pub pair: TradingPair,
    pub guard: Arc<CapacityGuard>,
    pub feed: Option<Arc<dyn PriceFeed>>,
    pub exchange: Option<Arc<dyn ExchangeClient>>,
    /// Seed for randomized providers; `None` seeds from the wall clock.
    pub seed: Option<u64>,
}

impl StrategyContext {
    fn feed(&self) -> Result<Arc<dyn PriceFeed>, ConfigError> {
        self.feed
            .clone()
            .ok_or(ConfigError::MissingField { field: "feed" })
    }

    fn exchange(&self) -> Result<Arc<dyn ExchangeClient>, ConfigError> {
        self.exchange
            .clone()
            .ok_or(ConfigError::MissingField { field: "paper.book" })
    }

    fn level_side(
        &self,
        config: &StrategyConfig,
        side: Side,
        provider: Box<dyn LevelProvider>,
    ) -> Box<dyn SideStrategy> {
        Box::new(LevelSideStrategy::new(
            side,
            &self.pair,
            provider,
            self.guard.clone(),
            config.tolerances,
            config.constraints,
        ))
    }
}

fn static_provider(
    levels: &[StaticLevel],
    amount_of_base: Volume,
    offset_percent: Decimal,
    side: Side,
    feed: Arc<dyn PriceFeed>,
) -> Result<Box<dyn LevelProvider>, ConfigError> {
    let provider = StaticSpreadProvider::new(levels.to_vec(), amount_of_base, side, feed)?
        .with_offset(offset_percent)?;
    Ok(Box::new(provider))
}

fn autonomous_provider(
    config: &AutonomousConfig,
    side: Side,
    seed: Option<u64>,
) -> Result<Box<dyn LevelProvider>, ConfigError> {
    let provider = match seed {
        Some(seed) => {
            let offset = match side {
                Side::Buy => 0,
                Side::Sell => 1,
            };
            AutonomousProvider::new(
                config.clone(),
                side,
                Box::new(StdRng::seed_from_u64(seed.wrapping_add(offset))),
            )?
        }
        None => AutonomousProvider::seeded_from_clock(config.clone(), side)?,
    };
    Ok(Box::new(provider))
}

/// Build a strategy, validating its configuration.
///
/// Invalid parameters are rejected here so a misconfigured bot never starts.
pub fn build_strategy(
    config: &StrategyConfig,
    ctx: &StrategyContext,
) -> Result<Box<dyn Strategy>, ConfigError> {
    config.tolerances.validate()?;
    let name = config.kind.name();

    let (buy, sell): (Box<dyn SideStrategy>, Box<dyn SideStrategy>) = match &config.kind {
        StrategyKind::BuySell(c) => {
            let feed = ctx.feed()?;
            let buy = static_provider(&c.buy_levels, c.amount_of_base, c.offset_percent, Side::Buy, feed.clone())?;
            let sell = static_provider(&c.sell_levels, c.amount_of_base, c.offset_percent, Side::Sell, feed)?;
            (
                ctx.level_side(config, Side::Buy, buy),
                ctx.level_side(config, Side::Sell, sell),
            )
        }
        StrategyKind::Sell(c) => {
            let sell = static_provider(&c.levels, c.amount_of_base, c.offset_percent, Side::Sell, ctx.feed()?)?;
            (
                Box::new(DeleteSideStrategy::new(Side::Buy)),
                ctx.level_side(config, Side::Sell, sell),
            )
        }
        StrategyKind::Balanced(c) => {
            let buy = autonomous_provider(c, Side::Buy, ctx.seed)?;
            let sell = autonomous_provider(c, Side::Sell, ctx.seed)?;
            (
                ctx.level_side(config, Side::Buy, buy),
                ctx.level_side(config, Side::Sell, sell),
            )
        }
        StrategyKind::Mirror(c) => {
            let exchange = ctx.exchange()?;
            let buy = MirrorProvider::new(exchange.clone(), c.clone(), Side::Buy)?;
            let sell = MirrorProvider::new(exchange, c.clone(), Side::Sell)?;
            (
                ctx.level_side(config, Side::Buy, Box::new(buy)),
                ctx.level_side(config, Side::Sell, Box::new(sell)),
            )
        }
        StrategyKind::Delete => (
            Box::new(DeleteSideStrategy::new(Side::Buy)),
            Box::new(DeleteSideStrategy::new(Side::Sell)),
        ),
    };

    info!(
        strategy = name,
        pair = %ctx.pair,
        price_tolerance = %config.tolerances.price,
        amount_tolerance = %config.tolerances.amount,
        "Strategy built"
    );
    Ok(Box::new(ComposeStrategy::new(name, buy, sell)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PaperLedger;
    use crate::domain::{AccountId, Asset, LiveOrder, SideOrders};
    use crate::feed::FixedFeed;
    use crate::risk::{ExposureTracker, ReserveLimits};
    use rust_decimal_macros::dec;

    fn ctx(feed: Option<Arc<dyn PriceFeed>>) -> StrategyContext {
        let ledger = Arc::new(PaperLedger::new(AccountId::from("GACCOUNT"), 0));
        let tracker = Arc::new(ExposureTracker::new(ledger, AccountId::from("GACCOUNT")));
        StrategyContext {
            pair: TradingPair::new(Asset::Native, Asset::credit("USD", "GI")),
            guard: Arc::new(CapacityGuard::new(tracker, ReserveLimits::default()).unwrap()),
            feed,
            exchange: None,
            seed: Some(7),
        }
    }

    fn parse(toml_str: &str) -> StrategyConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn parses_buysell_with_tolerances() {
        let config = parse(
            r#"
            kind = "buysell"
            price_tolerance = 0.005
            amount_tolerance = 0.01
            amount_of_base = 100
            sell_levels = [{ spread = 0.01, amount = 0.5 }, { spread = 0.02, amount = 0.3 }]
            buy_levels = [{ spread = 0.01, amount = 0.5 }]

            [constraints]
            price_precision = 4
            "#,
        );

        assert_eq!(config.kind.name(), "buysell");
        assert_eq!(config.tolerances.price, dec!(0.005));
        assert_eq!(config.tolerances.amount, dec!(0.01));
        assert_eq!(config.constraints.price_precision, 4);
        match config.kind {
            StrategyKind::BuySell(c) => {
                assert_eq!(c.sell_levels.len(), 2);
                assert_eq!(c.buy_levels[0], StaticLevel::new(dec!(0.01), dec!(0.5)));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn builds_every_kind() {
        let feed: Arc<dyn PriceFeed> = Arc::new(FixedFeed::new(dec!(2)));
        let configs = [
            "kind = \"buysell\"\namount_of_base = 10",
            "kind = \"sell\"\namount_of_base = 10\nlevels = []",
            "kind = \"balanced\"\nspread = 0.02\nmax_levels = 3",
            "kind = \"delete\"",
        ];
        for source in configs {
            let config = parse(source);
            let strategy = build_strategy(&config, &ctx(Some(feed.clone()))).unwrap();
            assert_eq!(strategy.name(), config.kind.name());
        }
    }

    #[test]
    fn static_strategies_need_a_feed() {
        let config = parse("kind = \"sell\"\namount_of_base = 10\nlevels = []");
        assert!(matches!(
            build_strategy(&config, &ctx(None)),
            Err(ConfigError::MissingField { field: "feed" })
        ));
    }

    #[test]
    fn mirror_needs_an_exchange() {
        let config = parse("kind = \"mirror\"\nsymbol = \"XLM/USD\"\nmax_levels = 2");
        assert!(matches!(
            build_strategy(&config, &ctx(None)),
            Err(ConfigError::MissingField { field: "paper.book" })
        ));
    }

    #[test]
    fn invalid_tolerance_is_fatal() {
        let config = parse("kind = \"delete\"\nprice_tolerance = 2");
        assert!(build_strategy(&config, &ctx(None)).is_err());
    }

    #[test]
    fn invalid_spread_is_fatal() {
        let config = parse(
            "kind = \"sell\"\namount_of_base = 10\nlevels = [{ spread = 1.5, amount = 1 }]",
        );
        let feed: Arc<dyn PriceFeed> = Arc::new(FixedFeed::new(dec!(2)));
        assert!(build_strategy(&config, &ctx(Some(feed))).is_err());
    }

    #[test]
    fn sell_strategy_prunes_all_buys() {
        let config = parse(
            "kind = \"sell\"\namount_of_base = 10\nlevels = [{ spread = 0.01, amount = 1 }]",
        );
        let feed: Arc<dyn PriceFeed> = Arc::new(FixedFeed::new(dec!(2)));
        let strategy = build_strategy(&config, &ctx(Some(feed))).unwrap();
        let usd = Asset::credit("USD", "GI");
        let orders = SideOrders {
            buying: vec![LiveOrder::new(1, usd.clone(), Asset::Native, dec!(0.5), dec!(1))],
            selling: Vec::new(),
        };

        let (deletes, retained) = strategy.prune_existing_orders(&orders);

        assert_eq!(deletes.len(), 1);
        assert!(retained.is_empty());
    }
}
