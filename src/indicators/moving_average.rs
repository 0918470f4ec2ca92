/// Simple Moving Average over the last `period` values.
pub fn calculate_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: f64 = values.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Exponential Moving Average series.
///
/// Recursive weighted form with weight 2/(period+1), seeded from the first
/// observation. The seed matters: downstream crossover numerics assume this
/// exact recurrence, not an SMA-seeded variant.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut series = Vec::with_capacity(values.len());
    let mut ema = values[0];
    series.push(ema);
    for &value in &values[1..] {
        ema = (value - ema) * alpha + ema;
        series.push(ema);
    }
    series
}
