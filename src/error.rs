use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::Asset;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors reported by the ledger collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The network rejected a transaction because its sequence number was stale.
    #[error("stale sequence number {sequence}")]
    StaleSequence { sequence: u64 },

    #[error("account not found: {account}")]
    AccountNotFound { account: String },

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),
}

impl LedgerError {
    /// Whether the error reports a sequence mismatch.
    #[must_use]
    pub const fn is_stale_sequence(&self) -> bool {
        matches!(self, Self::StaleSequence { .. })
    }
}

/// Price signal errors (price feeds and remote order books).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("price signal unavailable from {source_name}: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("invalid price {price}")]
    InvalidPrice { price: Decimal },

    #[error("order book for {pair} has no {side} levels")]
    EmptyBook { pair: String, side: &'static str },
}

/// Reasons an order was suppressed by the capacity guard.
///
/// These are not failures: the order is omitted from the tick's mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error(
        "reserve exposure exceeded: ({exposure} + {incremental}) / {magnifier} > {spendable}"
    )]
    ExposureLimitExceeded {
        exposure: Decimal,
        incremental: Decimal,
        magnifier: Decimal,
        spendable: Decimal,
    },

    #[error("trust limit exceeded for {asset}: {holding} + {incremental} > {limit}")]
    TrustLimitExceeded {
        asset: Asset,
        holding: Decimal,
        incremental: Decimal,
        limit: Decimal,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("strategy error: {0}")]
    Strategy(String),
}

impl Error {
    /// Whether this error wraps a stale-sequence rejection.
    #[must_use]
    pub const fn is_stale_sequence(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::StaleSequence { .. }))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
