// Execution layer: market data and order gateway seams plus the
// coordinator that drives the per-symbol decision cycle.

pub mod coordinator;
pub mod gateway;
pub mod simulated;

pub use coordinator::Coordinator;
pub use gateway::{MarketDataSource, OrderExecutionGateway};
pub use simulated::{SimulatedGateway, StaticDataSource, SyntheticFeed};
