//! Loading configuration files and assembling bots from them.

use std::io::Write;
use std::sync::Arc;

use rust_decimal_macros::dec;
use tempfile::NamedTempFile;
use tidemark::bot::{build_bot, TickOutcome};
use tidemark::config::Config;
use tidemark::error::{ConfigError, Error};
use tidemark::port::{ExchangeClient, LedgerClient};

const PAPER_SELL: &str = r#"
[account]
id = "GPAPERACCOUNT"

[pair]
base = "native"
quote = "USD:GISSUER"

[bot]
tick_interval_secs = 1
delete_cycles_threshold = 1

[risk]
operational_buffer = 1

[strategy]
kind = "sell"
price_tolerance = 0.005
amount_tolerance = 0.01
amount_of_base = 100
levels = [{ spread = 0.01, amount = 0.5 }, { spread = 0.02, amount = 0.3 }]

[feed]
kind = "fixed"
price = 2.0

[paper]
balances = [
    { asset = "native", amount = 100 },
    { asset = "USD:GISSUER", amount = 50, trust_limit = 1000000 },
]

[logging]
level = "debug"
format = "json"
"#;

const PAPER_MIRROR: &str = r#"
[account]
id = "GPAPERACCOUNT"

[pair]
base = "native"
quote = "USD:GISSUER"

[strategy]
kind = "mirror"
symbol = "XLM/USD"
max_levels = 2

[paper]
balances = [
    { asset = "native", amount = 1000 },
    { asset = "USD:GISSUER", amount = 500, trust_limit = 1000000 },
]

[paper.book]
asks = [{ price = 1.10, volume = 100 }, { price = 1.20, volume = 200 }]
bids = [{ price = 1.00, volume = 50 }, { price = 0.90, volume = 80 }]
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

fn paper(config: &Config) -> (Arc<dyn LedgerClient>, Option<Arc<dyn ExchangeClient>>) {
    let ledger: Arc<dyn LedgerClient> =
        Arc::new(config.paper.build_ledger(config.account_id().unwrap()));
    let exchange = config
        .paper
        .build_exchange()
        .map(|e| e as Arc<dyn ExchangeClient>);
    (ledger, exchange)
}

#[test]
fn loads_every_section_from_file() {
    let file = write_config(PAPER_SELL);

    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.bot.settings.tick_interval_secs, 1);
    assert_eq!(config.bot.settings.delete_cycles_threshold, 1);
    assert_eq!(config.risk.operational_buffer, dec!(1));
    assert_eq!(config.risk.base_reserve, dec!(0.5));
    assert_eq!(config.strategy.kind.name(), "sell");
    assert_eq!(config.paper.balances.len(), 2);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = Config::load(dir.path().join("absent.toml"));

    assert!(matches!(result, Err(Error::Config(ConfigError::ReadFile(_)))));
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let file = write_config("[pair\nbase = ");

    let result = Config::load(file.path());

    assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
}

#[test]
fn credit_balance_without_trust_limit_is_rejected() {
    let source = PAPER_SELL.replace(", trust_limit = 1000000", "");

    let result = Config::parse(&source);

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::MissingField {
            field: "paper.balances.trust_limit"
        }))
    ));
}

#[test]
fn invalid_reserve_is_rejected() {
    let source = PAPER_SELL.replace(
        "operational_buffer = 1",
        "fractional_reserve_magnifier = 0",
    );

    assert!(Config::parse(&source).is_err());
}

#[test]
fn configured_bot_places_sell_levels() {
    let config = Config::parse(PAPER_SELL).unwrap();
    let (ledger, exchange) = paper(&config);
    let mut bot = build_bot(&config, ledger.clone(), exchange).unwrap();

    let report = tokio_test::block_on(bot.tick());

    assert_eq!(report.outcome, TickOutcome::Synced { pruned: 0, submitted: 2 });
    let orders = tokio_test::block_on(ledger.load_orders(&config.account_id().unwrap())).unwrap();
    let mut asks: Vec<_> = orders.iter().map(|o| (o.price, o.amount)).collect();
    asks.sort();
    assert_eq!(asks, vec![(dec!(2.02), dec!(50)), (dec!(2.04), dec!(30))]);
}

#[tokio::test]
async fn mirror_copies_the_paper_book() {
    let config = Config::parse(PAPER_MIRROR).unwrap();
    let (ledger, exchange) = paper(&config);
    assert!(exchange.is_some());
    let mut bot = build_bot(&config, ledger.clone(), exchange).unwrap();

    let report = bot.tick().await;

    assert_eq!(report.outcome, TickOutcome::Synced { pruned: 0, submitted: 4 });
    let orders = ledger.load_orders(&config.account_id().unwrap()).await.unwrap();
    let mut asks: Vec<_> = orders
        .iter()
        .filter(|o| o.selling.is_native())
        .map(|o| (o.price, o.amount))
        .collect();
    asks.sort();
    assert_eq!(asks, vec![(dec!(1.10), dec!(100)), (dec!(1.20), dec!(200))]);

    let mut bids: Vec<_> = orders
        .iter()
        .filter(|o| !o.selling.is_native())
        .filter_map(|o| o.inverted_price())
        .collect();
    bids.sort();
    assert_eq!(bids.len(), 2);
    assert_eq!(bids[1], dec!(1));
}

#[test]
fn mirror_without_paper_book_fails_to_build() {
    let source = PAPER_MIRROR
        .split("[paper.book]")
        .next()
        .unwrap()
        .to_string();
    let config = Config::parse(&source).unwrap();
    let (ledger, exchange) = paper(&config);

    let result = build_bot(&config, ledger, exchange);

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::MissingField { field: "paper.book" }))
    ));
}

#[tokio::test]
async fn dry_run_from_config_leaves_ledger_untouched() {
    let source = PAPER_SELL.replace("delete_cycles_threshold = 1", "dry_run = true");
    let config = Config::parse(&source).unwrap();
    let (ledger, exchange) = paper(&config);
    let mut bot = build_bot(&config, ledger.clone(), exchange).unwrap();

    let report = bot.tick().await;

    assert!(report.outcome.is_synced());
    let orders = ledger.load_orders(&config.account_id().unwrap()).await.unwrap();
    assert!(orders.is_empty());
}
