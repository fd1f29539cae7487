//! Relative Strength Index with Wilder's smoothing.
//!
//! The first average gain/loss is the simple mean of the first n changes;
//! afterwards avg = (prev_avg * (n-1) + current) / n.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), and 100 when avg_loss == 0.
//! Warmup: first n values are `None`.

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return values;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);

    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;
    values[period] = Some(rsi_from(avg_gain, avg_loss));

    for i in (period + 1)..closes.len() {
        let change = changes[i - 1];
        avg_gain = (avg_gain * (period - 1) as f64 + gain(change)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(change)) / period as f64;
        values[i] = Some(rsi_from(avg_gain, avg_loss));
    }

    values
}

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_warmup_is_period_bars() {
        let values = calculate_rsi(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert!(values[..3].iter().all(Option::is_none));
        assert!(values[3].is_some());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let values = calculate_rsi(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(values[4], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let values = calculate_rsi(&[5.0, 4.0, 3.0, 2.0, 1.0], 3);
        assert!(values[4].unwrap().abs() < 1e-12);
    }

    #[test]
    fn rsi_balanced_changes_is_50() {
        let values = calculate_rsi(&[10.0, 11.0, 10.0], 2);
        assert!((values[2].unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_wilder_smoothing() {
        // changes: +1, -1, +2
        let values = calculate_rsi(&[10.0, 11.0, 10.0, 12.0], 2);
        let avg_gain = (0.5 * 1.0 + 2.0) / 2.0;
        let avg_loss = (0.5 * 1.0 + 0.0) / 2.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert!((values[3].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_short_input_is_all_none() {
        assert_eq!(calculate_rsi(&[1.0, 2.0], 14), vec![None, None]);
    }
}
