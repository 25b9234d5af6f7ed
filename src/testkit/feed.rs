//! Scripted price feed.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::Price;
use crate::error::SignalError;
use crate::port::PriceFeed;

/// Feed returning whatever price the test last set. `None` means unavailable.
#[derive(Debug)]
pub struct ScriptedFeed {
    price: Mutex<Option<Price>>,
    calls: AtomicU64,
}

impl ScriptedFeed {
    pub fn fixed(price: Price) -> Self {
        Self {
            price: Mutex::new(Some(price)),
            calls: AtomicU64::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            price: Mutex::new(None),
            calls: AtomicU64::new(0),
        }
    }

    pub fn set_price(&self, price: Price) {
        *self.price.lock() = Some(price);
    }

    pub fn set_unavailable(&self) {
        *self.price.lock() = None;
    }

    /// Number of times the price was requested.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PriceFeed for ScriptedFeed {
    async fn get_price(&self) -> Result<Price, SignalError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        (*self.price.lock()).ok_or_else(|| SignalError::Unavailable {
            source_name: "scripted".into(),
            reason: "no price scripted".into(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
