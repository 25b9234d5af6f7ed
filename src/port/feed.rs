//! Price feed port.

use async_trait::async_trait;

use crate::domain::Price;
use crate::error::SignalError;

/// Source of a center price for spread-based strategies.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the latest price (quote-per-base).
    async fn get_price(&self) -> Result<Price, SignalError>;

    /// Feed name for logging.
    fn name(&self) -> &str;
}
