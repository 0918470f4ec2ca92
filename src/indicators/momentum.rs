/// Rate-of-change momentum: close relative to the close `lookback` values
/// ago, as a signed fraction.
pub fn calculate_momentum(values: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || values.len() < lookback + 1 {
        return None;
    }
    let current = values[values.len() - 1];
    let past = values[values.len() - 1 - lookback];
    if past == 0.0 {
        return None;
    }
    Some(current / past - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_momentum_positive_in_uptrend() {
        let values: Vec<f64> = (0..20).map(|i| 1.10 + 0.001 * i as f64).collect();
        let momentum = calculate_momentum(&values, 12).unwrap();
        assert!(momentum > 0.0);
    }

    #[test]
    fn test_momentum_exact_ratio() {
        let mut values = vec![1.0; 13];
        values[12] = 1.1;
        let momentum = calculate_momentum(&values, 12).unwrap();
        assert!((momentum - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_insufficient_data() {
        let values = vec![1.10; 12];
        assert!(calculate_momentum(&values, 12).is_none());
    }
}
