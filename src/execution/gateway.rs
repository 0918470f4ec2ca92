use crate::error::Result;
use crate::models::{
    AccountSnapshot, Bar, CloseConfirmation, OrderConfirmation, OrderRequest, Timeframe,
};

/// Source of chronological OHLC history.
///
/// Implementations return the most recent `count` bars, oldest first, and
/// may return fewer when history is short. Callers decide whether a short
/// window is usable.
pub trait MarketDataSource: Send {
    fn get_bars(&self, symbol: &str, timeframe: Timeframe, count: usize) -> Result<Vec<Bar>>;
}

/// Broker-side order placement and account queries.
///
/// Every mutation of coordinator position state goes through a confirmed
/// call here first; a returned error means nothing was traded.
pub trait OrderExecutionGateway: Send {
    /// Submit an entry order. Ok means the order filled.
    fn place_order(&mut self, request: &OrderRequest) -> Result<OrderConfirmation>;

    /// Close the open position on `symbol` at the given market price,
    /// reporting the realized profit.
    fn close_position(&mut self, symbol: &str, price: f64) -> Result<CloseConfirmation>;

    fn account_snapshot(&self) -> Result<AccountSnapshot>;
}
