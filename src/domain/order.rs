//! Orders resting on the ledger's book.

use rust_decimal::Decimal;

use super::{Asset, OrderId, Price, TradingPair, Volume};

/// An order currently resting on the book for the managed account.
///
/// `price` is buying-per-selling and `amount` is denominated in the selling
/// asset, which is how the ledger reports offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveOrder {
    pub id: OrderId,
    pub selling: Asset,
    pub buying: Asset,
    pub price: Price,
    pub amount: Volume,
}

impl LiveOrder {
    pub fn new(
        id: impl Into<OrderId>,
        selling: Asset,
        buying: Asset,
        price: Price,
        amount: Volume,
    ) -> Self {
        Self {
            id: id.into(),
            selling,
            buying,
            price,
            amount,
        }
    }

    /// Price expressed as selling-per-buying, if the price is non-zero.
    pub fn inverted_price(&self) -> Option<Price> {
        Decimal::ONE.checked_div(self.price)
    }

    /// Amount of the buying asset received if the order fills completely.
    pub fn buying_amount(&self) -> Volume {
        self.amount * self.price
    }

    pub fn sells(&self, selling: &Asset, buying: &Asset) -> bool {
        &self.selling == selling && &self.buying == buying
    }
}

/// Live orders of one pair, split by side and sorted innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideOrders {
    /// Orders selling quote for base.
    pub buying: Vec<LiveOrder>,
    /// Orders selling base for quote.
    pub selling: Vec<LiveOrder>,
}

impl SideOrders {
    /// Split the account's orders into the pair's two sides.
    ///
    /// Both sides are sorted by price ascending in their own selling terms, so
    /// index 0 is always the best price of that side. Strategies match orders
    /// to levels by index, so every tick must sort the same way.
    pub fn partition(orders: &[LiveOrder], pair: &TradingPair) -> Self {
        let mut buying: Vec<LiveOrder> = orders
            .iter()
            .filter(|o| o.sells(&pair.quote, &pair.base))
            .cloned()
            .collect();
        let mut selling: Vec<LiveOrder> = orders
            .iter()
            .filter(|o| o.sells(&pair.base, &pair.quote))
            .cloned()
            .collect();
        sort_by_price(&mut buying);
        sort_by_price(&mut selling);
        Self { buying, selling }
    }

    pub fn len(&self) -> usize {
        self.buying.len() + self.selling.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveOrder> {
        self.buying.iter().chain(self.selling.iter())
    }
}

/// Sort by price ascending; ties break on order id so the order is stable.
pub fn sort_by_price(orders: &mut [LiveOrder]) {
    orders.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)));
}
