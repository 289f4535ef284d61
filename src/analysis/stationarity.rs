//! Augmented Dickey-Fuller stationarity test.
//!
//! The regression carries a constant:
//!
//! ```text
//! Δy_t = α + β y_{t-1} + Σ_{i=1..k} γ_i Δy_{t-i} + ε_t
//! ```
//!
//! H0: the series has a unit root (non-stationary). The number of lagged
//! differences `k` is chosen by AIC over a common sample, p-values come from
//! MacKinnon's (1994) regression surface and critical values from
//! MacKinnon's (2010) response surface, both for the constant-only case.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::analysis::rolling::rolling_stats;
use crate::analysis::stats::{is_constant, ols, OlsFit};
use crate::error::{ForecastError, Result};
use crate::models::{CriticalValues, Observation, RollingStats, StationarityReport};
use crate::render::{Chart, ChartSeries, Renderer};

/// Fewest non-missing observations the test accepts.
pub const MIN_OBSERVATIONS: usize = 10;

// MacKinnon (1994), constant only, one variable.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010), constant only, one variable: b0 + b1/T + b2/T^2 + b3/T^3.
const CRIT_1: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Approximate p-value of an ADF statistic.
pub fn mackinnon_p_value(stat: f64) -> f64 {
    if stat > TAU_MAX {
        return 1.0;
    }
    if stat < TAU_MIN {
        return 0.0;
    }
    let z = if stat <= TAU_STAR {
        polyval(&TAU_SMALL_P, stat)
    } else {
        polyval(&TAU_LARGE_P, stat)
    };
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(z),
        Err(_) => f64::NAN,
    }
}

/// Critical values for a regression with `nobs` observations.
pub fn mackinnon_critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    CriticalValues {
        one_pct: polyval(&CRIT_1, inv),
        five_pct: polyval(&CRIT_5, inv),
        ten_pct: polyval(&CRIT_10, inv),
    }
}

/// Default upper bound on lagged differences: `ceil(12 (n/100)^{1/4})`,
/// capped so the regression keeps enough degrees of freedom.
pub fn default_max_lag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min((n / 2).saturating_sub(2))
}

/// Build the ADF design for `k` lagged differences using rows whose
/// difference index starts at `start` (`start >= k`).
fn adf_design(data: &[f64], diff: &[f64], k: usize, start: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = diff.len() - start;
    let cols = 2 + k;
    let mut x = Vec::with_capacity(rows * cols);
    let mut y = Vec::with_capacity(rows);
    for t in start..diff.len() {
        y.push(diff[t]);
        x.push(data[t]);
        x.push(1.0);
        for i in 1..=k {
            x.push(diff[t - i]);
        }
    }
    (DMatrix::from_row_slice(rows, cols, &x), DVector::from_vec(y))
}

/// Run the ADF test on `data`. NaN entries are removed first.
///
/// `max_lag` overrides [`default_max_lag`]; the lag actually used is the
/// AIC-minimising one in `0..=max_lag`.
pub fn adf_test(data: &[f64], max_lag: Option<usize>) -> Result<StationarityReport> {
    let data: Vec<f64> = data.iter().copied().filter(|x| !x.is_nan()).collect();
    let n = data.len();
    if n < MIN_OBSERVATIONS {
        return Err(ForecastError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: n,
        });
    }
    if is_constant(&data) {
        return Err(ForecastError::InvalidArgument(
            "ADF test is undefined for a constant series".into(),
        ));
    }

    let max_lag = max_lag
        .unwrap_or_else(|| default_max_lag(n))
        .min((n / 2).saturating_sub(2));
    let diff: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();

    // Select k on the common sample that the largest lag allows.
    let mut best: Option<(f64, usize)> = None;
    for k in 0..=max_lag {
        let (x, y) = adf_design(&data, &diff, k, max_lag);
        if let Some(fit) = ols(&x, &y) {
            let aic = fit.aic();
            debug!(lag = k, aic, "ADF lag candidate");
            if best.map_or(true, |(b, _)| aic < b) {
                best = Some((aic, k));
            }
        }
    }
    let (_, used_lag) = best.ok_or_else(|| {
        ForecastError::ModelFit("ADF regression is singular for every lag".into())
    })?;

    let (x, y) = adf_design(&data, &diff, used_lag, used_lag);
    let fit: OlsFit = ols(&x, &y)
        .ok_or_else(|| ForecastError::ModelFit("ADF regression is singular".into()))?;
    let statistic = fit.t_value(0);
    let n_obs = fit.nobs;

    Ok(StationarityReport::new(
        statistic,
        mackinnon_p_value(statistic),
        mackinnon_critical_values(n_obs),
        used_lag,
        n_obs,
    ))
}

// ---------------------------------------------------------------------------
// StationarityTester
// ---------------------------------------------------------------------------

/// ADF report plus the rolling statistics that were plotted alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct StationarityOutcome {
    pub report: StationarityReport,
    pub rolling: RollingStats,
}

/// Rolling statistics, the ADF test, and the diagnostic chart for one series.
#[derive(Debug, Clone, Copy)]
pub struct StationarityTester {
    window: usize,
}

impl StationarityTester {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Test a dated series (raw or differenced).
    ///
    /// The chart of the series with its rolling mean and standard deviation
    /// goes to `renderer`; the report is returned.
    pub fn test(
        &self,
        title: &str,
        points: &[Observation],
        renderer: &mut dyn Renderer,
    ) -> Result<StationarityOutcome> {
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();

        let rolling = rolling_stats(&values, self.window);
        let chart = Chart::line(title, "Date", "Value")
            .with_series(ChartSeries::dated("Original", &dates, &values))
            .with_series(ChartSeries::dated("Rolling mean", &dates, &rolling.mean))
            .with_series(ChartSeries::dated("Rolling Std Dev", &dates, &rolling.std));
        renderer.render(&chart)?;

        let report = adf_test(&values, None)?;
        Ok(StationarityOutcome { report, rolling })
    }
}
