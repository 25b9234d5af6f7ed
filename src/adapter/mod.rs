//! Implementations of ports.

pub mod exchange;
pub mod paper;

pub use exchange::StaticExchange;
pub use paper::PaperLedger;
