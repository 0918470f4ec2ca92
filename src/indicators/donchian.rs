//! Donchian channel: rolling max/min of high/low over N bars.
//!
//! Callers shift the input slice themselves when the comparison must
//! exclude recent bars (the breakout engine compares against the channel
//! as of the previous bar).

/// Highest value of the last `period` entries.
pub fn channel_high(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    values
        .iter()
        .rev()
        .take(period)
        .copied()
        .fold(None, |max, v| Some(max.map_or(v, |m: f64| m.max(v))))
}

/// Lowest value of the last `period` entries.
pub fn channel_low(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    values
        .iter()
        .rev()
        .take(period)
        .copied()
        .fold(None, |min, v| Some(min.map_or(v, |m: f64| m.min(v))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_bounds() {
        let values = vec![1.10, 1.15, 1.12, 1.08, 1.11];
        assert_eq!(channel_high(&values, 3), Some(1.12));
        assert_eq!(channel_low(&values, 3), Some(1.08));
        assert_eq!(channel_high(&values, 5), Some(1.15));
    }

    #[test]
    fn test_channel_window_excludes_older_values() {
        let values = vec![2.0, 1.0, 1.0, 1.0];
        assert_eq!(channel_high(&values, 3), Some(1.0));
    }

    #[test]
    fn test_channel_insufficient_data() {
        let values = vec![1.10, 1.15];
        assert!(channel_high(&values, 3).is_none());
        assert!(channel_low(&values, 3).is_none());
    }
}
