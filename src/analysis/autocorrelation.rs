//! Autocorrelation diagnostics used to eyeball AR and MA orders.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::analysis::stats::{mean, variance};
use crate::render::{Chart, ChartSeries};

/// Autocorrelation for lags `0..=max_lag` (biased estimator, lag 0 = 1).
pub fn acf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return vec![];
    }

    let max_lag = max_lag.min(n - 1);
    let m = mean(data);
    let var = variance(data);

    if var == 0.0 {
        return vec![1.0; max_lag + 1];
    }

    (0..=max_lag)
        .map(|lag| {
            if lag == 0 {
                return 1.0;
            }
            let sum: f64 = data[lag..]
                .iter()
                .zip(data[..n - lag].iter())
                .map(|(a, b)| (a - m) * (b - m))
                .sum();
            sum / (n as f64 * var)
        })
        .collect()
}

/// Partial autocorrelation by Yule-Walker, solved with Durbin-Levinson.
pub fn pacf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let acf_values = acf(data, max_lag);
    if acf_values.is_empty() {
        return vec![];
    }

    let max_lag = max_lag.min(acf_values.len() - 1);
    let mut pacf_values = vec![0.0; max_lag + 1];
    pacf_values[0] = 1.0;

    if max_lag == 0 {
        return pacf_values;
    }

    let mut phi = vec![vec![0.0; max_lag + 1]; max_lag + 1];
    phi[1][1] = acf_values[1];
    pacf_values[1] = phi[1][1];

    for k in 2..=max_lag {
        let mut num = acf_values[k];
        let mut den = 1.0;
        for j in 1..k {
            num -= phi[k - 1][j] * acf_values[k - j];
            den -= phi[k - 1][j] * acf_values[j];
        }

        if den.abs() < 1e-10 {
            break;
        }

        phi[k][k] = num / den;
        pacf_values[k] = phi[k][k];

        for j in 1..k {
            phi[k][j] = phi[k - 1][j] - phi[k][k] * phi[k - 1][k - j];
        }
    }

    pacf_values
}

fn z_score(confidence: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(0.5 + confidence / 2.0))
        .unwrap_or(1.96)
}

/// Half-width of the ACF band at each lag under Bartlett's formula.
pub fn acf_bands(acf_values: &[f64], n: usize, confidence: f64) -> Vec<f64> {
    let z = z_score(confidence);
    let n = n as f64;
    let mut bands = Vec::with_capacity(acf_values.len());
    let mut sum_sq = 0.0;
    for (k, _) in acf_values.iter().enumerate() {
        let band = match k {
            0 => 0.0,
            1 => z * (1.0 / n).sqrt(),
            _ => {
                sum_sq += acf_values[k - 1].powi(2);
                z * ((1.0 + 2.0 * sum_sq) / n).sqrt()
            }
        };
        bands.push(band);
    }
    bands
}

/// Half-width of the PACF band: `z / √n` for every lag past zero.
pub fn pacf_bands(len: usize, n: usize, confidence: f64) -> Vec<f64> {
    let half = z_score(confidence) / (n as f64).sqrt();
    (0..len).map(|k| if k == 0 { 0.0 } else { half }).collect()
}

/// ACF and PACF of a series together with their confidence bands.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlogram {
    pub acf: Vec<f64>,
    pub acf_band: Vec<f64>,
    pub pacf: Vec<f64>,
    pub pacf_band: Vec<f64>,
}

impl Correlogram {
    pub fn compute(data: &[f64], lags: usize, confidence: f64) -> Self {
        let acf_values = acf(data, lags);
        let pacf_values = pacf(data, lags);
        Self {
            acf_band: acf_bands(&acf_values, data.len(), confidence),
            pacf_band: pacf_bands(pacf_values.len(), data.len(), confidence),
            acf: acf_values,
            pacf: pacf_values,
        }
    }

    /// Lags past zero whose ACF falls outside the band.
    pub fn significant_acf_lags(&self) -> Vec<usize> {
        significant(&self.acf, &self.acf_band)
    }

    /// Lags past zero whose PACF falls outside the band.
    pub fn significant_pacf_lags(&self) -> Vec<usize> {
        significant(&self.pacf, &self.pacf_band)
    }

    pub fn charts(&self) -> [Chart; 2] {
        let neg = |b: &[f64]| b.iter().map(|x| -x).collect::<Vec<_>>();
        [
            Chart::stem("Autocorrelation (ACF)")
                .with_series(ChartSeries::lagged("ACF", &self.acf))
                .with_series(ChartSeries::lagged("Upper band", &self.acf_band).dashed())
                .with_series(ChartSeries::lagged("Lower band", &neg(&self.acf_band)).dashed()),
            Chart::stem("Partial Autocorrelation (PACF)")
                .with_series(ChartSeries::lagged("PACF", &self.pacf))
                .with_series(ChartSeries::lagged("Upper band", &self.pacf_band).dashed())
                .with_series(ChartSeries::lagged("Lower band", &neg(&self.pacf_band)).dashed()),
        ]
    }
}

fn significant(values: &[f64], bands: &[f64]) -> Vec<usize> {
    values
        .iter()
        .zip(bands)
        .enumerate()
        .skip(1)
        .filter(|(_, (v, b))| v.abs() > **b)
        .map(|(k, _)| k)
        .collect()
}
