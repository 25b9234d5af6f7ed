//! Exposure tracking and pre-placement capacity checks.

mod capacity;
mod exposure;

pub use capacity::{CapacityCheck, CapacityGuard, OrderIntent, ReserveLimits};
pub use exposure::{ExposureTracker, Liabilities};
