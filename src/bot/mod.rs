//! The control loop.
//!
//! One [`Bot`] manages one trading pair. Each tick runs, strictly in order:
//!
//! 1. load balances
//! 2. load and sort live orders
//! 3. `pre_update`
//! 4. prune, submitted immediately
//! 5. reset the exposure cache
//! 6. `update_with_ops`
//! 7. submit, then reload the tracked orders
//! 8. `post_update`
//!
//! A failing stage aborts the rest of the tick and deletes every order the
//! bot tracks, so the book is either in sync with the latest levels or empty.
//! The tracked set is reloaded from the ledger after every submission and
//! again right before a delete-all, so orders committed by earlier batches are
//! never left behind.

mod builder;

pub use builder::build_bot;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::domain::{AccountId, Mutation, SideOrders, TradingPair};
use crate::error::{Error, LedgerError, Result};
use crate::ledger::Submitter;
use crate::port::LedgerClient;
use crate::risk::CapacityGuard;
use crate::strategy::Strategy;

/// Control loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotSettings {
    /// Delay after a tick completes before the next one starts.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Consecutive failed ticks tolerated before deleting all orders.
    #[serde(default)]
    pub delete_cycles_threshold: u32,
    /// Stop after this many ticks. `None` runs until shut down.
    #[serde(default)]
    pub iterations: Option<u64>,
}

const fn default_tick_interval_secs() -> u64 {
    5
}

impl BotSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            delete_cycles_threshold: 0,
            iterations: None,
        }
    }
}

/// Stage of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStage {
    LoadAccount,
    LoadOrders,
    PreUpdate,
    Prune,
    Update,
    Submit,
    Refresh,
    PostUpdate,
}

impl fmt::Display for TickStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadAccount => "load_account",
            Self::LoadOrders => "load_orders",
            Self::PreUpdate => "pre_update",
            Self::Prune => "prune",
            Self::Update => "update",
            Self::Submit => "submit",
            Self::Refresh => "refresh",
            Self::PostUpdate => "post_update",
        };
        f.write_str(name)
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Every stage succeeded.
    Synced { pruned: usize, submitted: usize },
    /// A stage failed but the failure count is still within the threshold.
    Held { stage: TickStage, failures: u32 },
    /// A stage failed and the tracked orders were deleted.
    DeletedAll { stage: TickStage, deleted: usize },
}

impl TickOutcome {
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// Report of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub at: DateTime<Utc>,
    pub outcome: TickOutcome,
}

#[derive(Debug)]
struct TickFailure {
    stage: TickStage,
    error: Error,
}

fn at<E: Into<Error>>(stage: TickStage) -> impl FnOnce(E) -> TickFailure {
    move |error| TickFailure {
        stage,
        error: error.into(),
    }
}

/// Control loop for one trading pair.
pub struct Bot {
    account: AccountId,
    pair: TradingPair,
    ledger: Arc<dyn LedgerClient>,
    strategy: Box<dyn Strategy>,
    guard: Arc<CapacityGuard>,
    submitter: Submitter,
    settings: BotSettings,
    /// Orders of the pair as last seen on the ledger; the target of delete-all.
    tracked: SideOrders,
    consecutive_failures: u32,
    ticks: u64,
}

impl Bot {
    pub fn new(
        account: AccountId,
        pair: TradingPair,
        ledger: Arc<dyn LedgerClient>,
        strategy: Box<dyn Strategy>,
        guard: Arc<CapacityGuard>,
        submitter: Submitter,
        settings: BotSettings,
    ) -> Self {
        Self {
            account,
            pair,
            ledger,
            strategy,
            guard,
            submitter,
            settings,
            tracked: SideOrders::default(),
            consecutive_failures: 0,
            ticks: 0,
        }
    }

    /// Orders the bot currently tracks.
    pub fn tracked_orders(&self) -> &SideOrders {
        &self.tracked
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run ticks until the configured iteration count is reached.
    ///
    /// Without an iteration count this never returns; the caller stops it by
    /// dropping the future.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            account = %self.account,
            pair = %self.pair,
            strategy = self.strategy.name(),
            ledger = self.ledger.ledger_name(),
            dry_run = self.submitter.is_dry_run(),
            "Starting control loop"
        );

        loop {
            let report = self.tick().await;
            debug!(tick = report.tick, at = %report.at, outcome = ?report.outcome, "Tick finished");

            if let Some(iterations) = self.settings.iterations {
                if self.ticks >= iterations {
                    info!(ticks = self.ticks, "Iteration limit reached");
                    return Ok(());
                }
            }
            tokio::time::sleep(self.settings.tick_interval()).await;
        }
    }

    /// Run a single tick.
    pub async fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let outcome = match self.sync().await {
            Ok((pruned, submitted)) => {
                self.consecutive_failures = 0;
                info!(tick = self.ticks, pruned, submitted, "Tick synced");
                TickOutcome::Synced { pruned, submitted }
            }
            Err(failure) => self.on_failure(failure).await,
        };
        TickReport {
            tick: self.ticks,
            at: Utc::now(),
            outcome,
        }
    }

    async fn sync(&mut self) -> std::result::Result<(usize, usize), TickFailure> {
        let account = self
            .ledger
            .load_account(&self.account)
            .await
            .map_err(at(TickStage::LoadAccount))?;
        let balances = account.pair_balances(&self.pair);
        self.guard.observe_account(account);

        let orders = self
            .ledger
            .load_orders(&self.account)
            .await
            .map_err(at(TickStage::LoadOrders))?;
        let orders = SideOrders::partition(&orders, &self.pair);
        self.tracked = orders.clone();
        debug!(
            base = %balances.base.available,
            quote = %balances.quote.available,
            buying = orders.buying.len(),
            selling = orders.selling.len(),
            "Loaded account state"
        );

        self.strategy
            .pre_update(&balances)
            .await
            .map_err(at(TickStage::PreUpdate))?;

        let (prune, retained) = self.strategy.prune_existing_orders(&orders);
        self.submitter
            .submit(&prune)
            .await
            .map_err(at(TickStage::Prune))?;
        if !prune.is_empty() && !self.submitter.is_dry_run() {
            self.tracked = retained.clone();
        }

        self.guard.exposure().reset_cache().await;

        let mutations = self
            .strategy
            .update_with_ops(&retained)
            .await
            .map_err(at(TickStage::Update))?;
        self.submitter
            .submit(&mutations)
            .await
            .map_err(at(TickStage::Submit))?;
        if !mutations.is_empty() && !self.submitter.is_dry_run() {
            self.refresh_tracked()
                .await
                .map_err(at(TickStage::Refresh))?;
        }

        self.strategy
            .post_update()
            .map_err(at(TickStage::PostUpdate))?;
        Ok((prune.len(), mutations.len()))
    }

    async fn on_failure(&mut self, failure: TickFailure) -> TickOutcome {
        self.consecutive_failures += 1;
        let TickFailure { stage, error } = failure;
        error!(
            tick = self.ticks,
            %stage,
            error = %error,
            failures = self.consecutive_failures,
            "Tick failed"
        );

        if self.consecutive_failures <= self.settings.delete_cycles_threshold {
            warn!(
                failures = self.consecutive_failures,
                threshold = self.settings.delete_cycles_threshold,
                "Keeping orders, failure threshold not reached"
            );
            return TickOutcome::Held {
                stage,
                failures: self.consecutive_failures,
            };
        }

        let deleted = self.delete_all().await;
        TickOutcome::DeletedAll { stage, deleted }
    }

    /// Reload the pair's resting orders into the tracked set.
    async fn refresh_tracked(&mut self) -> std::result::Result<(), LedgerError> {
        let orders = self.ledger.load_orders(&self.account).await?;
        self.tracked = SideOrders::partition(&orders, &self.pair);
        Ok(())
    }

    /// Delete every tracked order. Returns the number of deletes submitted.
    ///
    /// The tracked set is reloaded first; when that fails the last known set
    /// is deleted instead.
    async fn delete_all(&mut self) -> usize {
        if let Err(e) = self.refresh_tracked().await {
            warn!(
                error = %e,
                orders = self.tracked.len(),
                "Could not reload orders, deleting the last known set"
            );
        }

        let deletes: Vec<Mutation> = self.tracked.iter().map(Mutation::delete).collect();
        if deletes.is_empty() {
            info!("No tracked orders to delete");
            return 0;
        }

        warn!(orders = deletes.len(), "Deleting all tracked orders");
        match self.submitter.submit(&deletes).await {
            Ok(_) => {
                if !self.submitter.is_dry_run() {
                    self.tracked = SideOrders::default();
                }
                deletes.len()
            }
            Err(e) => {
                error!(error = %e, "Failed to delete tracked orders");
                0
            }
        }
    }
}
