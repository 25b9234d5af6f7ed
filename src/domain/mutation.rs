//! Order mutations emitted by strategies.

use std::fmt;

use super::{Asset, LiveOrder, OrderId, Price, Volume};

/// A change to the account's resting orders. Pure data until submitted.
///
/// Prices and amounts are in the ledger's offer terms: `price` is
/// buying-per-selling and `amount` is in the selling asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create {
        selling: Asset,
        buying: Asset,
        price: Price,
        amount: Volume,
    },
    Modify {
        order_id: OrderId,
        selling: Asset,
        buying: Asset,
        price: Price,
        amount: Volume,
    },
    Delete {
        order_id: OrderId,
        selling: Asset,
        buying: Asset,
    },
}

impl Mutation {
    /// Delete mutation for a live order.
    pub fn delete(order: &LiveOrder) -> Self {
        Self::Delete {
            order_id: order.id,
            selling: order.selling.clone(),
            buying: order.buying.clone(),
        }
    }

    /// Modify mutation that moves a live order to a new price and amount.
    pub fn modify(order: &LiveOrder, price: Price, amount: Volume) -> Self {
        Self::Modify {
            order_id: order.id,
            selling: order.selling.clone(),
            buying: order.buying.clone(),
            price,
            amount,
        }
    }

    pub const fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }

    pub const fn is_modify(&self) -> bool {
        matches!(self, Self::Modify { .. })
    }

    pub const fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }

    /// The order this mutation targets, if it targets an existing one.
    pub const fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Create { .. } => None,
            Self::Modify { order_id, .. } | Self::Delete { order_id, .. } => Some(*order_id),
        }
    }

    pub const fn selling(&self) -> &Asset {
        match self {
            Self::Create { selling, .. }
            | Self::Modify { selling, .. }
            | Self::Delete { selling, .. } => selling,
        }
    }

    /// Price and amount placed by this mutation, if any.
    pub const fn placement(&self) -> Option<(Price, Volume)> {
        match self {
            Self::Create { price, amount, .. } | Self::Modify { price, amount, .. } => {
                Some((*price, *amount))
            }
            Self::Delete { .. } => None,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create {
                selling,
                buying,
                price,
                amount,
            } => write!(f, "create sell {amount} {selling} for {buying} @ {price}"),
            Self::Modify {
                order_id,
                selling,
                buying,
                price,
                amount,
            } => write!(
                f,
                "modify #{order_id} sell {amount} {selling} for {buying} @ {price}"
            ),
            Self::Delete { order_id, .. } => write!(f, "delete #{order_id}"),
        }
    }
}
