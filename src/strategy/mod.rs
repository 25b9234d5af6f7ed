//! Order-book strategies.
//!
//! A [`Strategy`] manages both sides of a pair. Most strategies are a
//! [`ComposeStrategy`] pairing two [`SideStrategy`] implementations:
//!
//! - [`LevelSideStrategy`] - diffs a [`LevelProvider`](crate::level::LevelProvider)'s
//!   targets against the live orders of one side
//! - [`DeleteSideStrategy`] - removes every order on its side
//!
//! # Tick contract
//!
//! The control loop calls, in order:
//! 1. `pre_update` - refresh levels; an error means "do not trade this tick"
//! 2. `prune_existing_orders` - drop orders beyond the target level count
//! 3. `update_with_ops` - create/modify mutations for the remaining orders
//! 4. `post_update` - strategy-local bookkeeping
//!
//! Live orders are matched to levels by index. Callers must pass each side's
//! orders sorted by [`SideOrders::partition`] on every tick; any other order
//! makes the diff incorrect.

mod compose;
mod delete_side;
mod factory;
mod level_side;

pub use compose::ComposeStrategy;
pub use delete_side::DeleteSideStrategy;
pub use factory::{build_strategy, StrategyConfig, StrategyContext, StrategyKind};
pub use level_side::{LevelSideStrategy, Tolerances};

use async_trait::async_trait;

use crate::domain::{LiveOrder, Mutation, PairBalances, Price, Side, SideOrders};
use crate::error::Result;

/// Outcome of diffing one side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideUpdate {
    /// Mutations in submission order.
    pub mutations: Vec<Mutation>,
    /// Best price among the orders the side keeps, quote-per-base.
    ///
    /// Lowest ask on the sell side, highest bid on the buy side.
    pub top_price: Option<Price>,
}

/// One side of the book.
#[async_trait]
pub trait SideStrategy: Send + Sync {
    /// Which side this strategy manages.
    fn side(&self) -> Side;

    /// Delete live orders beyond the target level count.
    ///
    /// Returns the delete mutations and the retained orders, order preserved.
    fn prune_existing_orders(&self, orders: &[LiveOrder]) -> (Vec<Mutation>, Vec<LiveOrder>);

    /// Refresh target levels from the side's balances and price signal.
    async fn pre_update(&mut self, balances: &PairBalances) -> Result<()>;

    /// Diff targets against the retained live orders of this side.
    async fn update_with_ops(&mut self, orders: &[LiveOrder]) -> Result<SideUpdate>;

    /// Bookkeeping after the tick's mutations were submitted.
    fn post_update(&mut self) -> Result<()>;

    /// Best price this side placed on the last completed tick, quote-per-base.
    ///
    /// Recorded by `post_update`. `None` until a tick completes.
    fn last_top_price(&self) -> Option<Price> {
        None
    }
}

/// A strategy managing both sides of a pair.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    /// Delete orders beyond the target level count on both sides.
    fn prune_existing_orders(&self, orders: &SideOrders) -> (Vec<Mutation>, SideOrders);

    async fn pre_update(&mut self, balances: &PairBalances) -> Result<()>;

    /// Mutations for both sides, ordered to avoid self-crossing.
    async fn update_with_ops(&mut self, orders: &SideOrders) -> Result<Vec<Mutation>>;

    fn post_update(&mut self) -> Result<()>;
}
