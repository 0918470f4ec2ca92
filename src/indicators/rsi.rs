/// Relative Strength Index over rolling-mean gains and losses.
///
/// RSI = 100 - 100 / (1 + avg_gain / avg_loss). A window with no losses is
/// guarded to RSI = 100 rather than dividing by zero.
pub fn calculate_rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for window in values[values.len() - period - 1..].windows(2) {
        let change = window[1] - window[0];
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum += -change;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_mixed_series() {
        let values = vec![
            1.1000, 1.1005, 1.1010, 1.1002, 1.1008, 1.1015, 1.1020, 1.1012, 1.1018, 1.1025,
            1.1030, 1.1022, 1.1028, 1.1035, 1.1040,
        ];
        let rsi = calculate_rsi(&values, 14).unwrap();
        assert!(rsi > 50.0 && rsi < 100.0);
    }

    #[test]
    fn test_rsi_all_gains_guards_to_100() {
        let values = vec![1.10, 1.11, 1.12, 1.13, 1.14, 1.15];
        assert_eq!(calculate_rsi(&values, 5), Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses() {
        let values = vec![1.15, 1.14, 1.13, 1.12, 1.11, 1.10];
        let rsi = calculate_rsi(&values, 5).unwrap();
        assert!(rsi.abs() < 1e-9);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let values = vec![1.10, 1.11, 1.12];
        assert!(calculate_rsi(&values, 14).is_none());
    }

    #[test]
    fn test_rsi_uses_only_recent_window() {
        // big early losses must not affect a 3-period window of gains
        let values = vec![2.0, 1.0, 1.01, 1.02, 1.03];
        assert_eq!(calculate_rsi(&values, 3), Some(100.0));
    }
}
