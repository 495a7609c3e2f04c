//! Simple moving average.
//!
//! SMA[i] = mean(values[i-n+1..=i]). The first (n-1) positions are undefined.

/// Trailing mean over `window` values. Each window is summed afresh so a
/// run of identical inputs produces an exactly identical mean.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out: Vec<Option<f64>> = vec![None; values.len().min(window - 1)];
    out.extend(
        values
            .windows(window)
            .map(|w| Some(w.iter().sum::<f64>() / window as f64)),
    );
    out
}

pub fn sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_mean(closes, window)
}
