//! A side that wants no orders.

use async_trait::async_trait;

use super::{SideStrategy, SideUpdate};
use crate::domain::{LiveOrder, Mutation, PairBalances, Side};
use crate::error::Result;

/// Deletes every live order on its side and never places new ones.
#[derive(Debug, Clone, Copy)]
pub struct DeleteSideStrategy {
    side: Side,
}

impl DeleteSideStrategy {
    pub const fn new(side: Side) -> Self {
        Self { side }
    }
}

#[async_trait]
impl SideStrategy for DeleteSideStrategy {
    fn side(&self) -> Side {
        self.side
    }

    fn prune_existing_orders(&self, orders: &[LiveOrder]) -> (Vec<Mutation>, Vec<LiveOrder>) {
        (orders.iter().map(Mutation::delete).collect(), Vec::new())
    }

    async fn pre_update(&mut self, _balances: &PairBalances) -> Result<()> {
        Ok(())
    }

    async fn update_with_ops(&mut self, _orders: &[LiveOrder]) -> Result<SideUpdate> {
        Ok(SideUpdate::default())
    }

    fn post_update(&mut self) -> Result<()> {
        Ok(())
    }
}
