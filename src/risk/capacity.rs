//! Pre-placement checks that keep orders from depleting reserve capital.

use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use super::ExposureTracker;
use crate::domain::{Asset, LiveOrder, Price, Volume};
use crate::error::{ConfigError, LedgerError, RiskError};
use crate::port::AccountSnapshot;

/// Reserve requirements of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReserveLimits {
    /// Native amount the ledger locks per account entry.
    #[serde(default = "default_base_reserve")]
    pub base_reserve: Decimal,
    /// Native amount always kept free for fees.
    #[serde(default = "default_operational_buffer")]
    pub operational_buffer: Decimal,
    /// Divides committed native exposure before comparing it with the spendable balance.
    #[serde(default = "default_magnifier")]
    pub fractional_reserve_magnifier: Decimal,
}

fn default_base_reserve() -> Decimal {
    Decimal::new(5, 1) // 0.5
}

fn default_operational_buffer() -> Decimal {
    Decimal::from(20)
}

fn default_magnifier() -> Decimal {
    Decimal::ONE
}

impl ReserveLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_reserve < Decimal::ZERO {
            return Err(ConfigError::invalid("base_reserve", "must not be negative"));
        }
        if self.operational_buffer < Decimal::ZERO {
            return Err(ConfigError::invalid("operational_buffer", "must not be negative"));
        }
        if self.fractional_reserve_magnifier <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "fractional_reserve_magnifier",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Native amount the account must keep given its entry count.
    pub fn min_account_reserve(&self, subentry_count: u32) -> Decimal {
        (Decimal::TWO + Decimal::from(subentry_count)) * self.base_reserve
    }
}

impl Default for ReserveLimits {
    fn default() -> Self {
        Self {
            base_reserve: default_base_reserve(),
            operational_buffer: default_operational_buffer(),
            fractional_reserve_magnifier: default_magnifier(),
        }
    }
}

/// Result of a capacity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityCheck {
    /// The order may be placed.
    Approved,
    /// The order must be omitted this tick.
    Suppressed(RiskError),
}

impl CapacityCheck {
    /// Check if approved.
    pub fn is_approved(&self) -> bool {
        matches!(self, CapacityCheck::Approved)
    }

    /// Get the suppression reason if suppressed.
    pub fn rejection_error(&self) -> Option<&RiskError> {
        match self {
            CapacityCheck::Suppressed(e) => Some(e),
            CapacityCheck::Approved => None,
        }
    }
}

/// An order a strategy wants to create or modify.
#[derive(Debug, Clone, Copy)]
pub struct OrderIntent<'a> {
    pub selling: &'a Asset,
    pub buying: &'a Asset,
    pub price: Price,
    pub amount: Volume,
    /// The live order being modified, `None` for a new order.
    pub replaces: Option<&'a LiveOrder>,
}

/// Guards order sizing against reserve exposure and trust limits.
///
/// Orders that would breach a limit are suppressed rather than sized down.
pub struct CapacityGuard {
    exposure: Arc<ExposureTracker>,
    limits: ReserveLimits,
    account: RwLock<AccountSnapshot>,
}

impl CapacityGuard {
    pub fn new(exposure: Arc<ExposureTracker>, limits: ReserveLimits) -> Result<Self, ConfigError> {
        limits.validate()?;
        Ok(Self {
            exposure,
            limits,
            account: RwLock::new(AccountSnapshot::default()),
        })
    }

    /// Record the account state loaded at the start of a tick.
    pub fn observe_account(&self, snapshot: AccountSnapshot) {
        *self.account.write() = snapshot;
    }

    pub fn limits(&self) -> &ReserveLimits {
        &self.limits
    }

    pub fn exposure(&self) -> &Arc<ExposureTracker> {
        &self.exposure
    }

    /// Check an order and, if approved, record its commitment for the rest of the tick.
    pub async fn check(&self, intent: &OrderIntent<'_>) -> Result<CapacityCheck, LedgerError> {
        let account = self.account.read().clone();
        let (old_selling, old_buying) = intent
            .replaces
            .map(|o| (o.amount, o.buying_amount()))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        let selling_delta = intent.amount - old_selling;
        let buying_delta = intent.amount * intent.price - old_buying;
        let is_create = intent.replaces.is_none();

        let mut native_incremental = Decimal::ZERO;
        if intent.selling.is_native() {
            native_incremental += selling_delta;
        }
        if is_create {
            native_incremental += self.limits.base_reserve;
        }

        if native_incremental > Decimal::ZERO {
            let exposure = self.exposure.get_exposure().await?;
            let spendable = account.native_balance()
                - self.limits.min_account_reserve(account.subentry_count)
                - self.limits.operational_buffer;
            let magnifier = self.limits.fractional_reserve_magnifier;

            if (exposure + native_incremental) / magnifier > spendable {
                warn!(
                    %exposure,
                    incremental = %native_incremental,
                    %spendable,
                    "Not placing order, reserve exposure would be exceeded"
                );
                return Ok(CapacityCheck::Suppressed(RiskError::ExposureLimitExceeded {
                    exposure,
                    incremental: native_incremental,
                    magnifier,
                    spendable,
                }));
            }
        }

        if !intent.buying.is_native() && buying_delta > Decimal::ZERO {
            let balance = account.balance(intent.buying);
            if let Some(limit) = balance.trust_limit {
                let liabilities = self.exposure.liabilities().await?;
                let holding = balance.available + liabilities.buying(intent.buying);
                if holding + buying_delta > limit {
                    warn!(
                        asset = %intent.buying,
                        %holding,
                        incremental = %buying_delta,
                        %limit,
                        "Not placing order, trust limit would be exceeded"
                    );
                    return Ok(CapacityCheck::Suppressed(RiskError::TrustLimitExceeded {
                        asset: intent.buying.clone(),
                        holding,
                        incremental: buying_delta,
                        limit,
                    }));
                }
            }
        }

        self.exposure
            .record(intent.selling, selling_delta, intent.buying, buying_delta)
            .await;
        if is_create {
            self.account.write().subentry_count += 1;
        }
        Ok(CapacityCheck::Approved)
    }

    /// Release the commitment of an order deleted during the tick.
    pub async fn release(&self, order: &LiveOrder) {
        info!(order_id = %order.id, "Releasing commitment of deleted order");
        self.exposure
            .record(&order.selling, -order.amount, &order.buying, -order.buying_amount())
            .await;
    }
}
