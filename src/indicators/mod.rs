// Technical indicators module
// Pure rolling-window computations; snapshot builders assemble them
// per strategy variant.

pub mod atr;
pub mod bollinger;
pub mod donchian;
pub mod momentum;
pub mod moving_average;
pub mod rsi;
pub mod snapshot;

pub use atr::{calculate_atr, true_range_series, volatility_filter_passed};
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use donchian::{channel_high, channel_low};
pub use momentum::calculate_momentum;
pub use moving_average::{calculate_sma, ema_series};
pub use rsi::calculate_rsi;
pub use snapshot::{
    breakout_bars_required, build_breakout_snapshot, build_crossover_snapshot,
    crossover_bars_required, BreakoutSnapshot, CrossoverSnapshot, IndicatorSnapshot,
};
