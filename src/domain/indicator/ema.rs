//! Exponential moving average over an optional line.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = EMA[i-1] + k*(V[i] - EMA[i-1]),
//! which is V[i]*k + EMA[i-1]*(1-k) rearranged so a constant input stays exact.
//! Warmup: first (n-1) values are undefined.

/// EMA over a line that may start undefined (e.g. the MACD line).
///
/// The average is seeded with the mean of the first `period` consecutive
/// defined values. An undefined value after seeding resets the average,
/// which then needs a fresh seed window. The seed is summed as offsets from
/// the first window value so that a constant line seeds exactly.
pub fn ema_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema: Option<f64> = None;
    let mut run = 0usize;
    let mut base = 0.0;
    let mut sum = 0.0;

    for (i, value) in values.iter().enumerate() {
        let Some(v) = *value else {
            ema = None;
            run = 0;
            sum = 0.0;
            continue;
        };

        match ema {
            Some(prev) => {
                let next = prev + k * (v - prev);
                ema = Some(next);
                out[i] = Some(next);
            }
            None => {
                if run == 0 {
                    base = v;
                }
                run += 1;
                sum += v - base;
                if run == period {
                    let seed = base + sum / period as f64;
                    ema = Some(seed);
                    out[i] = Some(seed);
                }
            }
        }
    }
    out
}
