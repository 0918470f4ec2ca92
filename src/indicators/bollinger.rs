use crate::indicators::calculate_sma;

/// Bollinger bands: rolling mean with bands at `width` sample standard
/// deviations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub mid: f64,
    pub upper: f64,
    pub lower: f64,
}

pub fn calculate_bollinger(values: &[f64], period: usize, width: f64) -> Option<BollingerBands> {
    if period < 2 || values.len() < period {
        return None;
    }
    let mid = calculate_sma(values, period)?;
    let window = &values[values.len() - period..];
    // sample variance (n - 1 denominator), matching the reference numerics
    let variance =
        window.iter().map(|v| (v - mid) * (v - mid)).sum::<f64>() / (period as f64 - 1.0);
    let stddev = variance.sqrt();
    Some(BollingerBands {
        mid,
        upper: mid + width * stddev,
        lower: mid - width * stddev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let values = vec![1.10; 20];
        let bands = calculate_bollinger(&values, 20, 2.0).unwrap();
        assert_eq!(bands.mid, 1.10);
        assert_eq!(bands.upper, 1.10);
        assert_eq!(bands.lower, 1.10);
    }

    #[test]
    fn test_bollinger_bands_bracket_mid() {
        let values: Vec<f64> = (0..30)
            .map(|i| 1.10 + 0.002 * ((i % 5) as f64))
            .collect();
        let bands = calculate_bollinger(&values, 20, 2.0).unwrap();
        assert!(bands.upper > bands.mid);
        assert!(bands.lower < bands.mid);
    }

    #[test]
    fn test_bollinger_insufficient_data() {
        let values = vec![1.10; 10];
        assert!(calculate_bollinger(&values, 20, 2.0).is_none());
    }
}
