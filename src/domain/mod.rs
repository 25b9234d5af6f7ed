//! Ledger-agnostic domain types.

mod asset;
mod ids;
mod level;
mod money;
mod mutation;
mod order;

pub use asset::{Asset, Balance, PairBalances, ParseAssetError, TradingPair};
pub use ids::{AccountId, OrderId, TxHash};
pub use level::{Level, Side};
pub use money::{OrderConstraints, Price, Volume};
pub use mutation::Mutation;
pub use order::{sort_by_price, LiveOrder, SideOrders};
