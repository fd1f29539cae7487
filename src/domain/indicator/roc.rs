//! Rate of Change.
//!
//! ROC(n)[i] = (C[i] - C[i-n]) / C[i-n] * 100, 0 when C[i-n] == 0.
//! Warmup: first n values are `None`.

pub fn calculate_roc(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            if period == 0 || i < period {
                return None;
            }
            let prev = closes[i - period];
            if prev == 0.0 {
                Some(0.0)
            } else {
                Some((close - prev) / prev * 100.0)
            }
        })
        .collect()
}
