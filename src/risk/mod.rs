// Risk management module
pub mod manager;

pub use manager::{DailyLossLedger, RiskManager, MIN_LOT};
