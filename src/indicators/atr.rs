//! Average True Range (ATR)
//!
//! True Range is the greatest of:
//! - Current High - Current Low
//! - Abs(Current High - Previous Close)
//! - Abs(Current Low - Previous Close)
//!
//! ATR here is the plain rolling mean of true ranges, not Wilder
//! smoothing.

use crate::models::Bar;

/// True range per bar, starting from the second bar.
pub fn true_range_series(bars: &[Bar]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(bars.len().saturating_sub(1));
    for window in bars.windows(2) {
        let prev_close = window[0].close;
        let bar = &window[1];
        let tr = (bar.high - bar.low)
            .max((bar.high - prev_close).abs())
            .max((bar.low - prev_close).abs());
        ranges.push(tr);
    }
    ranges
}

/// ATR aligned to the most recent bar, or None on insufficient data.
pub fn calculate_atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }
    let ranges = true_range_series(bars);
    let sum: f64 = ranges.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Rolling ATR values, one per bar once `period` true ranges exist.
pub fn atr_series(bars: &[Bar], period: usize) -> Vec<f64> {
    let ranges = true_range_series(bars);
    if period == 0 || ranges.len() < period {
        return Vec::new();
    }
    ranges
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Volatility filter: current ATR must exceed its recent mean by a factor.
///
/// Passes by default while there is not yet `lookback` worth of ATR history,
/// so quiet early windows do not suppress every entry.
pub fn volatility_filter_passed(
    bars: &[Bar],
    period: usize,
    lookback: usize,
    threshold: f64,
) -> bool {
    let series = atr_series(bars, period);
    if series.len() < lookback {
        return true;
    }
    let current = series[series.len() - 1];
    let recent: f64 = series.iter().rev().take(lookback).sum::<f64>() / lookback as f64;
    current > recent * threshold
}
