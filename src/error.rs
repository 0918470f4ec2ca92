use thiserror::Error;

/// Errors surfaced by the decision engine.
///
/// Policy rejections (daily-loss breaker, correlation cap) are logged and
/// suppress the trade rather than being raised, so they have no variant
/// here; computation guards such as the RSI division-by-zero case resolve
/// to in-band defaults. Everything that does escape a component is one of
/// these variants.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no market data available for {symbol}")]
    NoData { symbol: String },

    #[error("invalid bar window: {0}")]
    InvalidBars(String),

    #[error("order execution failed: {reason}")]
    ExecutionFailure { reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown strategy '{0}' (expected 'breakout' or 'crossover')")]
    UnknownStrategy(String),
}

pub type Result<T> = std::result::Result<T, Error>;
