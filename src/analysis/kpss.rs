//! KPSS level-stationarity test, used to pick the differencing order.
//!
//! H0: the series is level-stationary. Unlike ADF, a small p-value here
//! argues *for* differencing.

use crate::analysis::stats::{is_constant, mean};
use crate::models::difference;

const TABLE: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const TABLE_P: [f64; 4] = [0.10, 0.05, 0.025, 0.01];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpssResult {
    pub statistic: f64,
    /// Interpolated from the tabulated critical values, so clamped to
    /// `[0.01, 0.10]`.
    pub p_value: f64,
    pub lags: usize,
}

/// KPSS statistic with a Bartlett-weighted long-run variance and the short
/// lag rule `trunc(3 √n / 13)`.
pub fn kpss_test(data: &[f64]) -> Option<KpssResult> {
    let n = data.len();
    if n < 2 {
        return None;
    }
    let m = mean(data);
    let res: Vec<f64> = data.iter().map(|x| x - m).collect();

    let mut cumsum = 0.0;
    let mut eta = 0.0;
    for r in &res {
        cumsum += r;
        eta += cumsum * cumsum;
    }
    eta /= (n * n) as f64;

    let lags = (3.0 * (n as f64).sqrt() / 13.0).trunc() as usize;
    let mut s2 = res.iter().map(|r| r * r).sum::<f64>();
    for l in 1..=lags.min(n - 1) {
        let weight = 1.0 - l as f64 / (lags + 1) as f64;
        let gamma: f64 = res[l..].iter().zip(&res[..n - l]).map(|(a, b)| a * b).sum();
        s2 += 2.0 * weight * gamma;
    }
    s2 /= n as f64;
    if s2 <= 0.0 || !s2.is_finite() {
        return None;
    }

    let statistic = eta / s2;
    Some(KpssResult {
        statistic,
        p_value: interpolate_p(statistic),
        lags,
    })
}

fn interpolate_p(stat: f64) -> f64 {
    if stat <= TABLE[0] {
        return TABLE_P[0];
    }
    for i in 1..TABLE.len() {
        if stat <= TABLE[i] {
            let frac = (stat - TABLE[i - 1]) / (TABLE[i] - TABLE[i - 1]);
            return TABLE_P[i - 1] + frac * (TABLE_P[i] - TABLE_P[i - 1]);
        }
    }
    TABLE_P[TABLE_P.len() - 1]
}

/// Number of differences needed before KPSS stops rejecting stationarity
/// at level `alpha`, at most `max_d`.
pub fn ndiffs(data: &[f64], alpha: f64, max_d: usize) -> usize {
    if is_constant(data) {
        return 0;
    }
    let Some(mut result) = kpss_test(data) else {
        return 0;
    };
    let mut d = 0;
    let mut x = data.to_vec();
    while result.p_value < alpha && d < max_d {
        d += 1;
        x = difference(&x, 1);
        if is_constant(&x) {
            return d;
        }
        match kpss_test(&x) {
            Some(r) => result = r,
            None => return d - 1,
        }
    }
    d
}
