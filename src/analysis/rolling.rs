use crate::analysis::stats::{mean, sample_std};
use crate::models::RollingStats;

/// Rolling mean over `window` observations, aligned with `data`.
///
/// Index `i` holds the mean of `data[i + 1 - window..=i]`; earlier indices,
/// and any window containing a NaN, are NaN.
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<f64> {
    rolling(data, window, mean)
}

/// Rolling sample standard deviation, aligned like [`rolling_mean`].
pub fn rolling_std(data: &[f64], window: usize) -> Vec<f64> {
    rolling(data, window, sample_std)
}

pub fn rolling_stats(data: &[f64], window: usize) -> RollingStats {
    RollingStats {
        window,
        mean: rolling_mean(data, window),
        std: rolling_std(data, window),
    }
}

fn rolling(data: &[f64], window: usize, f: fn(&[f64]) -> f64) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; data.len()];
    }
    (0..data.len())
        .map(|i| {
            if i + 1 < window {
                return f64::NAN;
            }
            let slice = &data[i + 1 - window..=i];
            if slice.iter().any(|x| x.is_nan()) {
                f64::NAN
            } else {
                f(slice)
            }
        })
        .collect()
}
