//! Level providers: turn balances and a price signal into target levels.
//!
//! Every provider works for one side of the book and returns levels in the
//! pair's terms (price quote-per-base, amount in base), innermost first.
//!
//! - [`StaticSpreadProvider`] - fixed spreads around an external center price
//! - [`AutonomousProvider`] - center price derived from the inventory ratio
//! - [`MirrorProvider`] - levels copied from a remote order book

mod autonomous;
mod mirror;
mod static_spread;

pub use autonomous::{AutonomousConfig, AutonomousProvider};
pub use mirror::{MirrorConfig, MirrorProvider};
pub use static_spread::{StaticLevel, StaticSpreadProvider};

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Level, Volume};
use crate::error::{ConfigError, Result};

/// Computes the target levels of one side of the book.
#[async_trait]
pub trait LevelProvider: Send + Sync {
    /// Compute levels given the available base and quote balances.
    ///
    /// An unavailable price signal is reported as an error; the caller must
    /// not trade on this tick.
    async fn get_levels(&self, max_base: Volume, max_quote: Volume) -> Result<Vec<Level>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Check that a fraction lies in `[0, 1]`. NaN is rejected.
pub(crate) fn check_fraction<T>(field: &'static str, value: T) -> std::result::Result<(), ConfigError>
where
    T: PartialOrd + Default + fmt::Display + From<u8>,
{
    let within = value >= T::default() && value <= T::from(1u8);
    if !within {
        return Err(ConfigError::invalid(
            field,
            format!("{value} must be within [0, 1]"),
        ));
    }
    Ok(())
}
