//! Schedule synchronization engine: domain types, storage seams, the
//! per-channel fetch orchestrator and the retention sweeper.

pub mod config;
pub mod error;
pub mod favorites;
pub mod memory;
pub mod platform;
pub mod store;
pub mod sweep;
pub mod sync;
pub mod types;
pub mod year_month;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use year_month::YearMonth;
