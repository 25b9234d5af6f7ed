//! Two side strategies combined into one strategy.

use async_trait::async_trait;
use tracing::debug;

use super::{SideStrategy, Strategy};
use crate::domain::{LiveOrder, Mutation, PairBalances, Side, SideOrders};
use crate::error::{ConfigError, Result};

/// Pairs a buy side and a sell side and orders their mutations.
///
/// Sell mutations go first when the new best ask is at or above the previous
/// best bid, as recorded by the buy side's `post_update`; otherwise the buy side moves out of the way first. Either order
/// keeps the account from resting an ask below its own bid between two
/// transactions.
pub struct ComposeStrategy {
    name: &'static str,
    buy: Box<dyn SideStrategy>,
    sell: Box<dyn SideStrategy>,
}

impl ComposeStrategy {
    pub fn new(
        name: &'static str,
        buy: Box<dyn SideStrategy>,
        sell: Box<dyn SideStrategy>,
    ) -> std::result::Result<Self, ConfigError> {
        if buy.side() != Side::Buy || sell.side() != Side::Sell {
            return Err(ConfigError::Other(format!(
                "{name}: expected buy and sell sides, got {} and {}",
                buy.side(),
                sell.side()
            )));
        }
        Ok(Self { name, buy, sell })
    }
}

#[async_trait]
impl Strategy for ComposeStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn prune_existing_orders(&self, orders: &SideOrders) -> (Vec<Mutation>, SideOrders) {
        let (mut mutations, buying) = self.buy.prune_existing_orders(&orders.buying);
        let (sell_deletes, selling) = self.sell.prune_existing_orders(&orders.selling);
        mutations.extend(sell_deletes);
        (mutations, SideOrders { buying, selling })
    }

    async fn pre_update(&mut self, balances: &PairBalances) -> Result<()> {
        self.buy.pre_update(balances).await?;
        self.sell.pre_update(balances).await
    }

    async fn update_with_ops(&mut self, orders: &SideOrders) -> Result<Vec<Mutation>> {
        let buy = self.buy.update_with_ops(&orders.buying).await?;
        let sell = self.sell.update_with_ops(&orders.selling).await?;

        // Live orders stand in until the buy side has completed a tick.
        let previous_bid = self
            .buy
            .last_top_price()
            .or_else(|| orders.buying.first().and_then(LiveOrder::inverted_price));
        let sell_first = match (sell.top_price, previous_bid) {
            (Some(ask), Some(bid)) => ask >= bid,
            _ => true,
        };
        debug!(
            strategy = self.name,
            new_ask = ?sell.top_price,
            previous_bid = ?previous_bid,
            sell_first,
            "Ordering side mutations"
        );

        let (first, second) = if sell_first {
            (sell.mutations, buy.mutations)
        } else {
            (buy.mutations, sell.mutations)
        };
        let mut mutations = first;
        mutations.extend(second);
        Ok(mutations)
    }

    fn post_update(&mut self) -> Result<()> {
        self.buy.post_update()?;
        self.sell.post_update()
    }
}
