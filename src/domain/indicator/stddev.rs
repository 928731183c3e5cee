//! Rolling population standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n-1) / n)
//! Warmup: first (n-1) values are undefined.

/// Mean and population standard deviation of the `period` values ending at
/// index `i`, or `None` while the window is incomplete.
pub(crate) fn window_mean_stddev(values: &[f64], i: usize, period: usize) -> Option<(f64, f64)> {
    if period == 0 || i + 1 < period || i >= values.len() {
        return None;
    }

    let window = &values[i + 1 - period..=i];
    let base = window[0];
    let mean: f64 = base + window.iter().map(|v| v - base).sum::<f64>() / period as f64;
    let variance: f64 = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;

    Some((mean, variance.sqrt()))
}
