//! Tidemark - automated market making on a ledger order book.
//!
//! The crate keeps a set of resting buy and sell orders in line with a target
//! price curve, and bounds order sizes so the account's reserve is never
//! depleted.
//!
//! # Architecture
//!
//! - **`level`** - Level providers turning balances and a price signal into
//!   target `(price, amount)` levels
//!   - `StaticSpreadProvider` - fixed spreads around a price feed
//!   - `AutonomousProvider` - center price derived from inventory
//!   - `MirrorProvider` - levels copied from a remote book
//! - **`strategy`** - Side strategies diffing levels against live orders, and
//!   the composed two-sided strategy ordering their mutations
//! - **`risk`** - Exposure tracking and the capacity guard
//! - **`ledger`** - Sequence number management and transaction batching
//! - **`bot`** - The control loop
//!
//! # Modules
//!
//! - [`adapter`] - Paper ledger and static exchange implementations of the ports
//! - [`bot`] - Control loop and its assembly from configuration
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Assets, balances, levels, orders and mutations
//! - [`error`] - Error types for the crate
//! - [`feed`] - Price feed implementations
//! - [`level`] - Level providers
//! - [`ledger`] - Sequencing and submission
//! - [`port`] - Trait definitions for external collaborators
//! - [`risk`] - Exposure tracking and capacity checks
//! - [`strategy`] - Strategy traits and implementations
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tidemark::bot::build_bot;
//! use tidemark::config::Config;
//!
//! # async fn run() -> tidemark::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let ledger = Arc::new(config.paper.build_ledger(config.account_id()?));
//! let mut bot = build_bot(&config, ledger, None)?;
//! let report = bot.tick().await;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod bot;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod level;
pub mod port;
pub mod risk;
pub mod strategy;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
