//! Levels derived from the account's own inventory ratio.
//!
//! The center price is `buying holdings / selling holdings`, so the curve
//! steepens as one side's inventory dominates. Levels are walked outward over a
//! simulated inventory: consuming level `i` moves the center price seen by
//! level `i + 1`. Amounts are jittered and some levels are skipped at random,
//! with their amount carried over to a later level.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, trace};

use super::{check_fraction, LevelProvider};
use crate::domain::{Level, Side, Volume};
use crate::error::{ConfigError, Error, Result};

/// Parameters of the autonomous curve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutonomousConfig {
    /// Full spread between the two sides; each level sits `spread / 2` outside its center.
    pub spread: f64,
    /// Inventory share above which the center price stops moving. `0` disables the plateau.
    #[serde(default)]
    pub plateau_threshold: f64,
    pub max_levels: u16,
    /// Probability that a level beyond `ensure_first_n_levels` is placed.
    #[serde(default = "default_probability")]
    pub level_density: f64,
    #[serde(default)]
    pub ensure_first_n_levels: u16,
    #[serde(default)]
    pub min_amount_spread: f64,
    #[serde(default)]
    pub max_amount_spread: f64,
    #[serde(default)]
    pub min_carryover_spread: f64,
    #[serde(default)]
    pub max_carryover_spread: f64,
    #[serde(default = "default_probability")]
    pub carryover_inclusion_probability: f64,
    /// Added to the base holdings to smooth the curve.
    #[serde(default)]
    pub virtual_balance_base: f64,
    /// Added to the quote holdings to smooth the curve.
    #[serde(default)]
    pub virtual_balance_quote: f64,
}

const fn default_probability() -> f64 {
    1.0
}

impl AutonomousConfig {
    /// Reject configurations the provider cannot trade with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_fraction("spread", self.spread)?;
        if self.spread == 0.0 {
            return Err(ConfigError::invalid(
                "spread",
                "must be positive, a zero spread places no levels",
            ));
        }
        check_fraction("level_density", self.level_density)?;
        check_fraction("min_amount_spread", self.min_amount_spread)?;
        check_fraction("max_amount_spread", self.max_amount_spread)?;
        check_fraction("min_carryover_spread", self.min_carryover_spread)?;
        check_fraction("max_carryover_spread", self.max_carryover_spread)?;
        check_fraction(
            "carryover_inclusion_probability",
            self.carryover_inclusion_probability,
        )?;

        if self.min_amount_spread > self.max_amount_spread {
            return Err(ConfigError::invalid(
                "min_amount_spread",
                format!(
                    "{} is greater than max_amount_spread {}",
                    self.min_amount_spread, self.max_amount_spread
                ),
            ));
        }
        if self.min_carryover_spread > self.max_carryover_spread {
            return Err(ConfigError::invalid(
                "min_carryover_spread",
                format!(
                    "{} is greater than max_carryover_spread {}",
                    self.min_carryover_spread, self.max_carryover_spread
                ),
            ));
        }
        let plateau_ok = self.plateau_threshold == 0.0
            || (self.plateau_threshold > 0.5 && self.plateau_threshold <= 1.0);
        if !plateau_ok {
            return Err(ConfigError::invalid(
                "plateau_threshold",
                format!("{} must be 0 or within (0.5, 1]", self.plateau_threshold),
            ));
        }
        let virtual_ok = self.virtual_balance_base.is_finite()
            && self.virtual_balance_quote.is_finite()
            && self.virtual_balance_base >= 0.0
            && self.virtual_balance_quote >= 0.0;
        if !virtual_ok {
            return Err(ConfigError::invalid(
                "virtual_balance",
                "virtual balances must be finite and not negative",
            ));
        }
        Ok(())
    }
}

/// Level provider whose center price follows the inventory ratio.
pub struct AutonomousProvider {
    config: AutonomousConfig,
    side: Side,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl std::fmt::Debug for AutonomousProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutonomousProvider")
            .field("config", &self.config)
            .field("side", &self.side)
            .finish_non_exhaustive()
    }
}

impl AutonomousProvider {
    /// Create a provider drawing randomness from `rng`.
    pub fn new(
        config: AutonomousConfig,
        side: Side,
        rng: Box<dyn RngCore + Send>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            side,
            rng: Mutex::new(rng),
        })
    }

    /// Create a provider seeded once from the wall clock.
    ///
    /// The seed is not refreshed per call, so successive ticks continue one
    /// random sequence.
    pub fn seeded_from_clock(
        config: AutonomousConfig,
        side: Side,
    ) -> std::result::Result<Self, ConfigError> {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(config, side, Box::new(StdRng::seed_from_u64(seed)))
    }

    /// Center price of the simulated inventory, clamped by the plateau.
    fn center_price(&self, selling: f64, buying: f64) -> f64 {
        let center = buying / selling;
        let threshold = self.config.plateau_threshold;
        if threshold == 0.0 {
            return center;
        }
        // Holding more than `threshold` of the units on one side pins the ratio.
        let floor = (1.0 - threshold) / threshold;
        let ceiling = threshold / (1.0 - threshold);
        center.clamp(floor, ceiling)
    }

    /// Walk the curve in the side's own terms: selling `selling`, receiving `buying`.
    ///
    /// Returns `(price, amount)` with price buying-per-selling and amount in selling units.
    fn walk(&self, selling: f64, buying: f64) -> Vec<(f64, f64)> {
        let cfg = &self.config;
        let mut selling = selling + self.virtual_selling();
        let mut buying = buying + self.virtual_buying();
        let mut levels = Vec::new();
        if selling <= 0.0 || buying <= 0.0 {
            return levels;
        }

        let mut rng = self.rng.lock();
        let half_spread = cfg.spread / 2.0;
        let mut carryover = 0.0;

        for i in 0..cfg.max_levels {
            let center = self.center_price(selling, buying);
            let price = center * (1.0 + half_spread);
            let theoretical = half_spread * selling;
            let amount_spread = uniform(&mut **rng, cfg.min_amount_spread, cfg.max_amount_spread);
            let mut amount = theoretical * (1.0 - amount_spread);

            // Move the simulated inventory whether or not the level is placed.
            selling -= amount;
            buying += amount * price;
            if selling <= 0.0 || amount <= 0.0 {
                break;
            }

            let carryover_spread =
                uniform(&mut **rng, cfg.min_carryover_spread, cfg.max_carryover_spread);
            carryover *= 1.0 - carryover_spread;

            let include = i < cfg.ensure_first_n_levels || rng.gen::<f64>() < cfg.level_density;
            if include {
                if rng.gen::<f64>() < cfg.carryover_inclusion_probability {
                    amount += carryover;
                    carryover = 0.0;
                }
                trace!(level = i, price, amount, "Autonomous level placed");
                levels.push((price, amount));
            } else {
                trace!(level = i, amount, "Autonomous level skipped");
                carryover += amount;
            }
        }
        levels
    }

    fn virtual_selling(&self) -> f64 {
        match self.side {
            Side::Sell => self.config.virtual_balance_base,
            Side::Buy => self.config.virtual_balance_quote,
        }
    }

    fn virtual_buying(&self) -> f64 {
        match self.side {
            Side::Sell => self.config.virtual_balance_quote,
            Side::Buy => self.config.virtual_balance_base,
        }
    }
}

fn uniform(rng: &mut dyn RngCore, min: f64, max: f64) -> f64 {
    min + rng.gen::<f64>() * (max - min)
}

fn to_decimal(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value)
        .ok_or_else(|| Error::Strategy(format!("autonomous level value {value} is not representable")))
}

#[async_trait]
impl LevelProvider for AutonomousProvider {
    async fn get_levels(&self, max_base: Volume, max_quote: Volume) -> Result<Vec<Level>> {
        use rust_decimal::prelude::ToPrimitive;

        let base = max_base.to_f64().unwrap_or(0.0);
        let quote = max_quote.to_f64().unwrap_or(0.0);

        let walked = match self.side {
            Side::Sell => self.walk(base, quote),
            Side::Buy => self.walk(quote, base),
        };

        let mut levels = Vec::with_capacity(walked.len());
        for (price, amount) in walked {
            let level = match self.side {
                Side::Sell => Level::new(to_decimal(price)?, to_decimal(amount)?),
                // Walked in quote terms: price is base-per-quote, amount is quote.
                Side::Buy => Level::new(to_decimal(1.0 / price)?, to_decimal(amount * price)?),
            };
            levels.push(level);
        }
        debug!(side = %self.side, levels = levels.len(), "Autonomous levels computed");
        Ok(levels)
    }

    fn name(&self) -> &'static str {
        "autonomous"
    }
}
