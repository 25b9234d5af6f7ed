//! Diff engine between a provider's target levels and one side's live orders.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use super::{SideStrategy, SideUpdate};
use crate::domain::{
    Asset, Level, LiveOrder, Mutation, OrderConstraints, PairBalances, Price, Side, TradingPair,
    Volume,
};
use crate::error::{ConfigError, Result, SignalError};
use crate::level::{check_fraction, LevelProvider};
use crate::risk::{CapacityGuard, OrderIntent};

/// Fractional tolerances within which a live order is left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Tolerances {
    #[serde(default, rename = "price_tolerance")]
    pub price: Decimal,
    #[serde(default, rename = "amount_tolerance")]
    pub amount: Decimal,
}

impl Tolerances {
    pub fn new(price: Decimal, amount: Decimal) -> std::result::Result<Self, ConfigError> {
        let tolerances = Self { price, amount };
        tolerances.validate()?;
        Ok(tolerances)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_fraction("price_tolerance", self.price)?;
        check_fraction("amount_tolerance", self.amount)
    }

    /// Whether `live` lies within `[target * (1 - tol), target * (1 + tol)]`, bounds inclusive.
    fn within(tolerance: Decimal, live: Decimal, target: Decimal) -> bool {
        let low = target * (Decimal::ONE - tolerance);
        let high = target * (Decimal::ONE + tolerance);
        live >= low && live <= high
    }

    /// Whether a live order is close enough to its target to keep as is.
    fn accepts(&self, order: &LiveOrder, target: &OfferTarget) -> bool {
        Self::within(self.price, order.price, target.price)
            && Self::within(self.amount, order.amount, target.amount)
    }
}

/// A level converted to the ledger's offer terms for this side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OfferTarget {
    /// Buying-per-selling.
    price: Price,
    /// In the selling asset, capped and rounded. Zero means "no order here".
    amount: Volume,
}

/// Reconciles one side of the book against a [`LevelProvider`].
///
/// The sell side sells base for quote and places levels as they are. The buy
/// side sells quote for base, so a level `(p, a)` becomes an offer at price
/// `1 / p` for `a * p` quote.
pub struct LevelSideStrategy {
    side: Side,
    selling: Asset,
    buying: Asset,
    provider: Box<dyn LevelProvider>,
    guard: Arc<CapacityGuard>,
    tolerances: Tolerances,
    constraints: OrderConstraints,
    targets: Vec<OfferTarget>,
    pending_top: Option<Price>,
    last_top: Option<Price>,
}

impl LevelSideStrategy {
    pub fn new(
        side: Side,
        pair: &TradingPair,
        provider: Box<dyn LevelProvider>,
        guard: Arc<CapacityGuard>,
        tolerances: Tolerances,
        constraints: OrderConstraints,
    ) -> Self {
        let (selling, buying) = match side {
            Side::Sell => (pair.base.clone(), pair.quote.clone()),
            Side::Buy => (pair.quote.clone(), pair.base.clone()),
        };
        Self {
            side,
            selling,
            buying,
            provider,
            guard,
            tolerances,
            constraints,
            targets: Vec::new(),
            pending_top: None,
            last_top: None,
        }
    }

    /// Number of levels targeted this tick.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Convert levels to offers, capping amounts at the side's balance.
    ///
    /// The balance is handed out innermost level first, so outer levels are
    /// the ones that shrink when funds run short.
    fn offer_targets(&self, levels: &[Level], available: Volume) -> Result<Vec<OfferTarget>> {
        let mut remaining = available.max(Decimal::ZERO);
        let mut targets = Vec::with_capacity(levels.len());

        for level in levels {
            if level.price <= Decimal::ZERO {
                return Err(SignalError::InvalidPrice { price: level.price }.into());
            }
            let (price, amount) = match self.side {
                Side::Sell => (level.price, level.amount),
                Side::Buy => (Decimal::ONE / level.price, level.amount * level.price),
            };
            let amount = self
                .constraints
                .placeable_amount(amount.max(Decimal::ZERO).min(remaining));
            remaining -= amount;
            targets.push(OfferTarget {
                price: self.constraints.round_price(price),
                amount,
            });
        }
        Ok(targets)
    }

    /// Offer price expressed quote-per-base.
    fn pair_price(&self, offer_price: Price) -> Option<Price> {
        match self.side {
            Side::Sell => Some(offer_price),
            Side::Buy => Decimal::ONE.checked_div(offer_price),
        }
    }

    fn track_top(&self, top: &mut Option<Price>, offer_price: Price) {
        let Some(price) = self.pair_price(offer_price) else {
            return;
        };
        let better = match (*top, self.side) {
            (None, _) => true,
            (Some(current), Side::Sell) => price < current,
            (Some(current), Side::Buy) => price > current,
        };
        if better {
            *top = Some(price);
        }
    }

    fn intent<'a>(&'a self, target: &OfferTarget, replaces: Option<&'a LiveOrder>) -> OrderIntent<'a> {
        OrderIntent {
            selling: &self.selling,
            buying: &self.buying,
            price: target.price,
            amount: target.amount,
            replaces,
        }
    }
}

#[async_trait]
impl SideStrategy for LevelSideStrategy {
    fn side(&self) -> Side {
        self.side
    }

    fn prune_existing_orders(&self, orders: &[LiveOrder]) -> (Vec<Mutation>, Vec<LiveOrder>) {
        let keep = self.targets.len().min(orders.len());
        let (retained, excess) = orders.split_at(keep);
        let deletes: Vec<Mutation> = excess.iter().map(Mutation::delete).collect();
        if !deletes.is_empty() {
            info!(side = %self.side, count = deletes.len(), "Pruning orders beyond target levels");
        }
        (deletes, retained.to_vec())
    }

    async fn pre_update(&mut self, balances: &PairBalances) -> Result<()> {
        let (max_base, max_quote) = (balances.base.available, balances.quote.available);
        let levels = self.provider.get_levels(max_base, max_quote).await?;
        let available = match self.side {
            Side::Sell => max_base,
            Side::Buy => max_quote,
        };
        self.targets = self.offer_targets(&levels, available)?;
        self.pending_top = None;

        debug!(
            side = %self.side,
            provider = self.provider.name(),
            levels = self.targets.len(),
            %available,
            "Levels refreshed"
        );
        Ok(())
    }

    async fn update_with_ops(&mut self, orders: &[LiveOrder]) -> Result<SideUpdate> {
        let mut mutations = Vec::new();
        let mut top = None;

        // Outermost level first, so the best prices are decided last.
        for (index, target) in self.targets.iter().enumerate().rev() {
            let live = orders.get(index);

            if target.amount.is_zero() {
                if let Some(order) = live {
                    debug!(side = %self.side, index, order_id = %order.id, "Level has no funds, deleting");
                    self.guard.release(order).await;
                    mutations.push(Mutation::delete(order));
                }
                continue;
            }

            match live {
                None => {
                    if self.guard.check(&self.intent(target, None)).await?.is_approved() {
                        mutations.push(Mutation::Create {
                            selling: self.selling.clone(),
                            buying: self.buying.clone(),
                            price: target.price,
                            amount: target.amount,
                        });
                        self.track_top(&mut top, target.price);
                    } else {
                        debug!(side = %self.side, index, "Create suppressed");
                    }
                }
                Some(order) if self.tolerances.accepts(order, target) => {
                    self.track_top(&mut top, order.price);
                }
                Some(order) => {
                    if self
                        .guard
                        .check(&self.intent(target, Some(order)))
                        .await?
                        .is_approved()
                    {
                        mutations.push(Mutation::modify(order, target.price, target.amount));
                        self.track_top(&mut top, target.price);
                    } else {
                        debug!(side = %self.side, index, order_id = %order.id, "Modify suppressed");
                        self.track_top(&mut top, order.price);
                    }
                }
            }
        }

        self.pending_top = top;
        Ok(SideUpdate {
            mutations,
            top_price: top,
        })
    }

    fn post_update(&mut self) -> Result<()> {
        self.last_top = self.pending_top.take();
        if let Some(top) = self.last_top {
            debug!(side = %self.side, %top, "Top of book");
        }
        Ok(())
    }

    fn last_top_price(&self) -> Option<Price> {
        self.last_top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::adapter::PaperLedger;
    use crate::domain::{AccountId, Balance};
    use crate::feed::FixedFeed;
    use crate::level::{StaticLevel, StaticSpreadProvider};
    use crate::port::AccountSnapshot;
    use crate::risk::{ExposureTracker, ReserveLimits};
    use rust_decimal_macros::dec;

    fn usd() -> Asset {
        Asset::credit("USD", "GISSUER")
    }

    fn pair() -> TradingPair {
        TradingPair::new(Asset::Native, usd())
    }

    fn balances(base: Decimal, quote: Decimal) -> PairBalances {
        PairBalances::new(Balance::native(base), Balance::credit(quote, dec!(1000000)))
    }

    fn guard(native: Decimal) -> Arc<CapacityGuard> {
        let ledger = Arc::new(PaperLedger::new(AccountId::from("GACCOUNT"), 0));
        let tracker = Arc::new(ExposureTracker::new(ledger, AccountId::from("GACCOUNT")));
        let guard = CapacityGuard::new(
            tracker,
            ReserveLimits {
                base_reserve: dec!(0),
                operational_buffer: dec!(0),
                fractional_reserve_magnifier: dec!(1),
            },
        )
        .unwrap();
        let mut balances = HashMap::new();
        balances.insert(Asset::Native, Balance::native(native));
        balances.insert(usd(), Balance::credit(dec!(0), dec!(1000000)));
        guard.observe_account(AccountSnapshot::new(balances, 0));
        Arc::new(guard)
    }

    fn strategy(side: Side, center: Decimal, levels: Vec<StaticLevel>, guard: Arc<CapacityGuard>) -> LevelSideStrategy {
        let provider =
            StaticSpreadProvider::new(levels, dec!(100), side, Arc::new(FixedFeed::new(center))).unwrap();
        LevelSideStrategy::new(
            side,
            &pair(),
            Box::new(provider),
            guard,
            Tolerances::new(dec!(0.005), dec!(0.01)).unwrap(),
            OrderConstraints::default(),
        )
    }

    fn two_levels() -> Vec<StaticLevel> {
        vec![
            StaticLevel::new(dec!(0.01), dec!(0.5)),
            StaticLevel::new(dec!(0.02), dec!(0.3)),
        ]
    }

    fn sell(id: u64, price: Decimal, amount: Decimal) -> LiveOrder {
        LiveOrder::new(id, Asset::Native, usd(), price, amount)
    }

    fn buy(id: u64, price: Decimal, amount: Decimal) -> LiveOrder {
        LiveOrder::new(id, usd(), Asset::Native, price, amount)
    }

    #[tokio::test]
    async fn creates_levels_outermost_first() {
        let mut side = strategy(Side::Sell, dec!(2.0), two_levels(), guard(dec!(1000)));
        side.pre_update(&balances(dec!(100), dec!(50))).await.unwrap();

        let update = side.update_with_ops(&[]).await.unwrap();

        assert_eq!(
            update.mutations,
            vec![
                Mutation::Create {
                    selling: Asset::Native,
                    buying: usd(),
                    price: dec!(2.04),
                    amount: dec!(30),
                },
                Mutation::Create {
                    selling: Asset::Native,
                    buying: usd(),
                    price: dec!(2.02),
                    amount: dec!(50),
                },
            ]
        );
        assert_eq!(update.top_price, Some(dec!(2.02)));
    }

    #[tokio::test]
    async fn unchanged_orders_emit_nothing() {
        let mut side = strategy(Side::Sell, dec!(2.0), two_levels(), guard(dec!(1000)));
        side.pre_update(&balances(dec!(100), dec!(50))).await.unwrap();
        let live = vec![sell(1, dec!(2.02), dec!(50)), sell(2, dec!(2.04), dec!(30))];

        let first = side.update_with_ops(&live).await.unwrap();
        let second = side.update_with_ops(&live).await.unwrap();

        assert!(first.mutations.is_empty());
        assert!(second.mutations.is_empty());
        assert_eq!(second.top_price, Some(dec!(2.02)));
    }

    #[tokio::test]
    async fn price_at_tolerance_bound_is_kept() {
        let mut side = strategy(Side::Sell, dec!(2.0), two_levels(), guard(dec!(1000)));
        side.pre_update(&balances(dec!(100), dec!(50))).await.unwrap();

        // 2.02 * 1.005 = 2.0301
        let at_bound = vec![sell(1, dec!(2.0301), dec!(50)), sell(2, dec!(2.04), dec!(30))];
        assert!(side.update_with_ops(&at_bound).await.unwrap().mutations.is_empty());

        let beyond = vec![sell(1, dec!(2.0302), dec!(50)), sell(2, dec!(2.04), dec!(30))];
        let update = side.update_with_ops(&beyond).await.unwrap();
        assert_eq!(
            update.mutations,
            vec![Mutation::modify(&beyond[0], dec!(2.02), dec!(50))]
        );
    }

    #[tokio::test]
    async fn amount_outside_tolerance_is_modified() {
        let mut side = strategy(Side::Sell, dec!(2.0), two_levels(), guard(dec!(1000)));
        side.pre_update(&balances(dec!(100), dec!(50))).await.unwrap();
        let live = vec![sell(1, dec!(2.02), dec!(50)), sell(2, dec!(2.04), dec!(25))];

        let update = side.update_with_ops(&live).await.unwrap();

        assert_eq!(update.mutations, vec![Mutation::modify(&live[1], dec!(2.04), dec!(30))]);
    }

    #[tokio::test]
    async fn prune_keeps_first_n_orders() {
        let mut side = strategy(Side::Sell, dec!(2.0), two_levels(), guard(dec!(1000)));
        side.pre_update(&balances(dec!(100), dec!(50))).await.unwrap();
        let live = vec![
            sell(1, dec!(2.02), dec!(50)),
            sell(2, dec!(2.04), dec!(30)),
            sell(3, dec!(2.06), dec!(10)),
            sell(4, dec!(2.08), dec!(10)),
            sell(5, dec!(2.10), dec!(10)),
        ];

        let (deletes, retained) = side.prune_existing_orders(&live);

        assert_eq!(deletes.len(), 3);
        assert!(deletes.iter().all(Mutation::is_delete));
        assert_eq!(retained, live[..2].to_vec());
    }

    #[tokio::test]
    async fn balance_goes_to_inner_levels_first() {
        let mut side = strategy(Side::Sell, dec!(2.0), two_levels(), guard(dec!(1000)));
        side.pre_update(&balances(dec!(60), dec!(0))).await.unwrap();

        let update = side.update_with_ops(&[]).await.unwrap();

        let placed: Vec<_> = update.mutations.iter().filter_map(Mutation::placement).collect();
        assert_eq!(placed, vec![(dec!(2.04), dec!(10)), (dec!(2.02), dec!(50))]);
    }

    #[tokio::test]
    async fn buy_side_sells_quote_at_inverted_price() {
        let levels = vec![
            StaticLevel::new(dec!(0.2), dec!(0.1)),
            StaticLevel::new(dec!(0.6), dec!(0.1)),
        ];
        let mut side = strategy(Side::Buy, dec!(2.5), levels, guard(dec!(1000)));
        side.pre_update(&balances(dec!(0), dec!(25))).await.unwrap();

        let update = side.update_with_ops(&[]).await.unwrap();

        // Levels: (2.0, 10) -> 20 quote at 0.5; (1.0, 10) -> 10 quote capped to 5 at 1.
        assert_eq!(
            update.mutations,
            vec![
                Mutation::Create {
                    selling: usd(),
                    buying: Asset::Native,
                    price: dec!(1),
                    amount: dec!(5),
                },
                Mutation::Create {
                    selling: usd(),
                    buying: Asset::Native,
                    price: dec!(0.5),
                    amount: dec!(20),
                },
            ]
        );
        assert_eq!(update.top_price, Some(dec!(2)));
    }

    #[tokio::test]
    async fn unfunded_level_deletes_its_order() {
        let levels = vec![
            StaticLevel::new(dec!(0.2), dec!(0.1)),
            StaticLevel::new(dec!(0.6), dec!(0.1)),
        ];
        let mut side = strategy(Side::Buy, dec!(2.5), levels, guard(dec!(1000)));
        side.pre_update(&balances(dec!(0), dec!(20))).await.unwrap();
        let live = vec![buy(1, dec!(0.5), dec!(20)), buy(2, dec!(1), dec!(10))];

        let update = side.update_with_ops(&live).await.unwrap();

        assert_eq!(update.mutations, vec![Mutation::delete(&live[1])]);
        assert_eq!(update.top_price, Some(dec!(2)));
    }

    #[tokio::test]
    async fn suppressed_create_is_omitted() {
        // Only 60 native spendable: the outer level (30) fits, the inner one (50) does not.
        let mut side = strategy(Side::Sell, dec!(2.0), two_levels(), guard(dec!(60)));
        side.pre_update(&balances(dec!(100), dec!(0))).await.unwrap();

        let update = side.update_with_ops(&[]).await.unwrap();

        assert_eq!(update.mutations.len(), 1);
        assert_eq!(update.mutations[0].placement(), Some((dec!(2.04), dec!(30))));
        assert_eq!(update.top_price, Some(dec!(2.04)));
    }

    #[tokio::test]
    async fn post_update_remembers_top() {
        let mut side = strategy(Side::Sell, dec!(2.0), two_levels(), guard(dec!(1000)));
        side.pre_update(&balances(dec!(100), dec!(50))).await.unwrap();
        side.update_with_ops(&[]).await.unwrap();
        assert_eq!(side.last_top_price(), None);

        side.post_update().unwrap();
        assert_eq!(side.last_top_price(), Some(dec!(2.02)));
    }

    #[test]
    fn tolerance_outside_unit_interval_is_rejected() {
        assert!(Tolerances::new(dec!(1.5), dec!(0)).is_err());
        assert!(Tolerances::new(dec!(0), dec!(-0.1)).is_err());
    }
}
