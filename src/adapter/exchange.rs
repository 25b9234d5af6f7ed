//! Exchange serving a fixed order book.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::SignalError;
use crate::port::{ExchangeClient, OrderBook};

/// Exchange client that returns a configured book for every symbol.
///
/// Used by paper trading to drive mirror strategies and book-based feeds.
/// A book of `None` makes every request fail as unavailable.
pub struct StaticExchange {
    book: RwLock<Option<OrderBook>>,
}

impl StaticExchange {
    pub fn new(book: OrderBook) -> Self {
        Self {
            book: RwLock::new(Some(book)),
        }
    }

    /// An exchange whose book can never be fetched.
    pub fn unavailable() -> Self {
        Self {
            book: RwLock::new(None),
        }
    }

    /// Replace the served book.
    pub fn set_book(&self, book: Option<OrderBook>) {
        *self.book.write() = book;
    }
}

#[async_trait]
impl ExchangeClient for StaticExchange {
    async fn get_order_book(&self, symbol: &str, depth: usize) -> Result<OrderBook, SignalError> {
        let book = self
            .book
            .read()
            .clone()
            .ok_or_else(|| SignalError::Unavailable {
                source_name: format!("{}:{symbol}", self.exchange_name()),
                reason: "no book available".into(),
            })?;
        Ok(OrderBook {
            asks: book.asks.into_iter().take(depth).collect(),
            bids: book.bids.into_iter().take(depth).collect(),
        })
    }

    fn exchange_name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::BookLevel;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn truncates_to_depth() {
        let exchange = StaticExchange::new(OrderBook::new(
            vec![
                BookLevel::new(dec!(1.1), dec!(1)),
                BookLevel::new(dec!(1.2), dec!(1)),
            ],
            vec![BookLevel::new(dec!(1.0), dec!(1))],
        ));

        let book = exchange.get_order_book("XLM/USD", 1).await.unwrap();
        assert_eq!(book.asks.len(), 1);
        assert_eq!(book.bids.len(), 1);
    }

    #[tokio::test]
    async fn cleared_book_is_unavailable() {
        let exchange = StaticExchange::new(OrderBook::default());
        exchange.set_book(None);

        assert!(matches!(
            exchange.get_order_book("XLM/USD", 5).await,
            Err(SignalError::Unavailable { .. })
        ));
    }
}
