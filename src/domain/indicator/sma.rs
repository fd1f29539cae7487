//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]), computed with a running sum.
//! Warmup: first (n-1) values are `None`.

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut values = Vec::with_capacity(closes.len());
    let mut sum = 0.0;

    for (i, &close) in closes.iter().enumerate() {
        sum += close;
        if i >= period {
            sum -= closes[i - period];
        }
        if i + 1 >= period {
            values.push(Some(sum / period as f64));
        } else {
            values.push(None);
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let values = calculate_sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert!(values[2].is_some());
    }

    #[test]
    fn sma_rolling_mean() {
        let values = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!((values[2].unwrap() - 20.0).abs() < 1e-12);
        assert!((values[3].unwrap() - 30.0).abs() < 1e-12);
        assert!((values[4].unwrap() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let values = calculate_sma(&[3.0, 7.0], 1);
        assert_eq!(values, vec![Some(3.0), Some(7.0)]);
    }

    #[test]
    fn sma_period_zero_is_all_none() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn sma_period_longer_than_input() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 5), vec![None, None]);
    }
}
