//! Trait definitions for external collaborators. Depend only on domain.
//!
//! The reconciliation core talks to the outside world through three ports:
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │   Bot / Strategies /     │
//!                 │   Risk / Sequencing      │
//!                 └──────────────────────────┘
//!                   │          │          │
//!                   ▼          ▼          ▼
//!             ┌─────────┐ ┌─────────┐ ┌──────────┐
//!             │ Ledger  │ │  Price  │ │ Exchange │
//!             │ Client  │ │  Feed   │ │  Client  │
//!             └─────────┘ └─────────┘ └──────────┘
//! ```
//!
//! - [`LedgerClient`] - balances, resting orders, sequence numbers, submission
//! - [`PriceFeed`] - center-price signal for spread-based strategies
//! - [`ExchangeClient`] - remote order books for mirroring and book-based feeds

mod exchange;
mod feed;
mod ledger;

pub use exchange::{BookLevel, ExchangeClient, OrderBook};
pub use feed::PriceFeed;
pub use ledger::{AccountSnapshot, LedgerClient, Transaction};
