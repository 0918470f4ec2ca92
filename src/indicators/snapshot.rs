use chrono::{DateTime, Utc};

use crate::config::StrategySettings;
use crate::indicators::{
    calculate_atr, calculate_bollinger, calculate_momentum, calculate_rsi, calculate_sma,
    channel_high, channel_low, ema_series, volatility_filter_passed,
};
use crate::models::Bar;

/// Indicator values backing one breakout evaluation.
///
/// The Donchian channels are the *previous* bar's channels, each computed
/// excluding its own bar, so the breakout comparison never sees the high
/// or low of the bar being evaluated (no lookahead).
#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub prev_entry_high: f64,
    pub prev_entry_low: f64,
    pub prev_exit_high: f64,
    pub prev_exit_low: f64,
    pub atr: f64,
    pub vol_filter_passed: bool,
    pub trend_up: bool,
    pub trend_down: bool,
}

/// Indicator values backing one EMA/MACD crossover evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub fast_ema: f64,
    pub slow_ema: f64,
    pub macd: f64,
    pub signal_line: f64,
    pub macd_hist: f64,
    pub prev_macd_hist: f64,
    pub rsi: f64,
    pub momentum: f64,
    pub atr: f64,
    pub bollinger_mid: f64,
    pub bollinger_upper: f64,
    pub bollinger_lower: f64,
}

/// Snapshot union carried through the common signal-engine interface.
///
/// Recomputed on every evaluation, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSnapshot {
    Breakout(BreakoutSnapshot),
    Crossover(CrossoverSnapshot),
}

impl IndicatorSnapshot {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            IndicatorSnapshot::Breakout(s) => s.timestamp,
            IndicatorSnapshot::Crossover(s) => s.timestamp,
        }
    }
}

/// Minimum window length for a breakout snapshot, safety margin included.
pub fn breakout_bars_required(settings: &StrategySettings) -> usize {
    settings
        .entry_period
        .max(settings.exit_period)
        .max(settings.trend_period)
        .max(settings.atr_period + 1)
        + 2
}

/// Minimum window length for a crossover snapshot. The slow EMA needs
/// extra warmup beyond its period for the recursive seed to wash out.
pub fn crossover_bars_required(settings: &StrategySettings) -> usize {
    settings
        .slow_ema
        .max(settings.rsi_period)
        .max(settings.bollinger_period)
        .max(settings.momentum_period + 1)
        .max(settings.atr_period + 1)
        + 30
}

/// Build the breakout snapshot for the most recent bar, or None when the
/// window is too short to decide anything.
pub fn build_breakout_snapshot(
    bars: &[Bar],
    settings: &StrategySettings,
) -> Option<BreakoutSnapshot> {
    let n = bars.len();
    if n < breakout_bars_required(settings) {
        return None;
    }
    let last = &bars[n - 1];

    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    // Channel as of the previous bar: drop the current bar, then drop the
    // previous bar itself from its own window.
    let shifted_highs = &highs[..n - 2];
    let shifted_lows = &lows[..n - 2];
    let prev_entry_high = channel_high(shifted_highs, settings.entry_period)?;
    let prev_entry_low = channel_low(shifted_lows, settings.entry_period)?;
    let prev_exit_high = channel_high(shifted_highs, settings.exit_period)?;
    let prev_exit_low = channel_low(shifted_lows, settings.exit_period)?;

    let atr = calculate_atr(bars, settings.atr_period)?;
    let vol_filter_passed = if settings.vol_filter {
        volatility_filter_passed(
            bars,
            settings.atr_period,
            settings.vol_lookback,
            settings.vol_threshold,
        )
    } else {
        true
    };

    let trend_sma = calculate_sma(&closes, settings.trend_period)?;

    Some(BreakoutSnapshot {
        timestamp: last.timestamp,
        close: last.close,
        prev_entry_high,
        prev_entry_low,
        prev_exit_high,
        prev_exit_low,
        atr,
        vol_filter_passed,
        trend_up: last.close > trend_sma,
        trend_down: last.close < trend_sma,
    })
}

/// Build the crossover snapshot for the most recent bar.
pub fn build_crossover_snapshot(
    bars: &[Bar],
    settings: &StrategySettings,
) -> Option<CrossoverSnapshot> {
    let n = bars.len();
    if n < crossover_bars_required(settings) {
        return None;
    }
    let last = &bars[n - 1];
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let fast = ema_series(&closes, settings.fast_ema);
    let slow = ema_series(&closes, settings.slow_ema);
    let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema_series(&macd, settings.signal_ema);
    let hist: Vec<f64> = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    let rsi = calculate_rsi(&closes, settings.rsi_period)?;
    let momentum = calculate_momentum(&closes, settings.momentum_period)?;
    let atr = calculate_atr(bars, settings.atr_period)?;
    let bands = calculate_bollinger(&closes, settings.bollinger_period, 2.0)?;

    Some(CrossoverSnapshot {
        timestamp: last.timestamp,
        close: last.close,
        fast_ema: fast[n - 1],
        slow_ema: slow[n - 1],
        macd: macd[n - 1],
        signal_line: signal[n - 1],
        macd_hist: hist[n - 1],
        prev_macd_hist: hist[n - 2],
        rsi,
        momentum,
        atr,
        bollinger_mid: bands.mid,
        bollinger_upper: bands.upper,
        bollinger_lower: bands.lower,
    })
}
