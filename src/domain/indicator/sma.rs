//! Simple moving average over an optional line.
//!
//! SMA(n)[i] = mean(V[i-n+1..=i]). Warmup: first (n-1) values are undefined.

/// Rolling mean over `period` values. A window containing an undefined
/// value is itself undefined; a zero period or a period longer than the
/// input yields all `None`. Offsets from the window's first value are
/// averaged so a constant window returns that constant exactly.
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let Some(base) = window[0] else { continue };
        let offsets: Option<f64> = window.iter().map(|v| v.map(|v| v - base)).sum();
        out[i] = offsets.map(|s| base + s / period as f64);
    }
    out
}
