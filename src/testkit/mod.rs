//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`feed`] - Scripted [`PriceFeed`](crate::port::PriceFeed) whose price can
//!   be changed or made unavailable between ticks.
//! - [`ledger`] - [`FlakyLedger`](ledger::FlakyLedger), a wrapper injecting
//!   ledger failures in front of any [`LedgerClient`](crate::port::LedgerClient).
//! - [`domain`] - Builders for assets, orders and funded paper ledgers.

pub mod domain;
pub mod feed;
pub mod ledger;
