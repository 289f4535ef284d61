//! ARIMA(p, d, q) fitted by conditional sum of squares.
//!
//! After differencing `d` times, the series `w` follows
//!
//! ```text
//! (w_t - μ) = Σ φ_i (w_{t-i} - μ) + ε_t + Σ θ_j ε_{t-j}
//! ```
//!
//! with `μ` fixed at zero when the model has no intercept. Starting values
//! come from the Hannan-Rissanen two-step regression and are refined by
//! Nelder-Mead on the conditional sum of squares. Parameters that make the
//! AR part non-stationary or the MA part non-invertible are rejected.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::analysis::stats::{mean, ols, sample_std};
use crate::error::{ForecastError, Result};
use crate::models::series::difference;
use crate::optim::{nelder_mead, NelderMeadOptions};

/// Extra observations required beyond `p + d + q`.
const MIN_EXTRA_OBS: usize = 10;

// ---------------------------------------------------------------------------
// ArimaOrder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Point forecasts on the original scale with `(1 - alpha)` intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub alpha: f64,
}

// ---------------------------------------------------------------------------
// ArimaModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ArimaModel {
    pub order: ArimaOrder,
    pub with_intercept: bool,
    /// Mean of the differenced series (zero without intercept).
    pub intercept: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    /// Innovation variance.
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Residuals entering the sum of squares.
    pub n_obs: usize,
    history: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
}

impl ArimaModel {
    /// Fit the model to `data` (undifferenced).
    pub fn fit(data: &[f64], order: ArimaOrder, with_intercept: bool) -> Result<Self> {
        let ArimaOrder { p, d, q } = order;
        let required = p + d + q + MIN_EXTRA_OBS;
        if data.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: data.len(),
            });
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(ForecastError::InvalidArgument(
                "series contains NaN or infinite values".into(),
            ));
        }

        let w = difference(data, d);
        let start = initial_params(&w, p, q, with_intercept);
        let steps = initial_steps(&w, p, q, with_intercept);

        let objective = |params: &[f64]| -> f64 {
            let (mu, ar, ma) = split_params(params, p, q, with_intercept);
            if !is_stationary(ar) || !is_invertible(ma) {
                return f64::INFINITY;
            }
            let css = sum_of_squares(&css_residuals(&w, mu, ar, ma), p);
            if css.is_finite() {
                css
            } else {
                f64::INFINITY
            }
        };

        let best = nelder_mead(&objective, &start, &steps, NelderMeadOptions::default());
        if !best.value.is_finite() {
            return Err(ForecastError::ModelFit(format!(
                "{} has no stationary, invertible solution",
                order
            )));
        }

        let (mu, ar, ma) = split_params(&best.x, p, q, with_intercept);
        let residuals = css_residuals(&w, mu, ar, ma);
        let n_obs = w.len() - p;
        let sigma2 = best.value / n_obs as f64;
        if !(sigma2 > 0.0) {
            return Err(ForecastError::ModelFit(format!(
                "{} fits the data exactly; innovation variance is zero",
                order
            )));
        }

        let n = n_obs as f64;
        let log_likelihood = -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        let k = (p + q + usize::from(with_intercept) + 1) as f64;

        Ok(Self {
            order,
            with_intercept,
            intercept: mu,
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            sigma2,
            log_likelihood,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n.ln(),
            n_obs,
            history: data.to_vec(),
            differenced: w,
            residuals,
        })
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals[self.order.p..]
    }

    /// Forecast `horizon` steps with 95% intervals.
    pub fn predict(&self, horizon: usize) -> Result<Prediction> {
        self.predict_with_alpha(horizon, 0.05)
    }

    /// Forecast `horizon` steps with `(1 - alpha)` intervals.
    pub fn predict_with_alpha(&self, horizon: usize, alpha: f64) -> Result<Prediction> {
        if !(0.0 < alpha && alpha < 1.0) {
            return Err(ForecastError::InvalidArgument(format!(
                "alpha must be in (0, 1), got {}",
                alpha
            )));
        }

        let mu = self.intercept;
        let mut z: Vec<f64> = self.differenced.iter().map(|w| w - mu).collect();
        let mut e = self.residuals.clone();
        let mut diff_forecast = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let t = z.len();
            let mut next = 0.0;
            for (i, phi) in self.ar.iter().enumerate() {
                next += phi * z[t - 1 - i];
            }
            for (j, theta) in self.ma.iter().enumerate() {
                if t > j {
                    next += theta * e[t - 1 - j];
                }
            }
            z.push(next);
            e.push(0.0);
            diff_forecast.push(next + mu);
        }

        let mean = integrate(&diff_forecast, &self.history, self.order.d);

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ModelFit(format!("normal distribution: {}", e)))?;
        let z_crit = normal.inverse_cdf(1.0 - alpha / 2.0);
        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let mut std_errors = Vec::with_capacity(horizon);
        for weight in &psi {
            cumulative += weight * weight;
            std_errors.push((self.sigma2 * cumulative).sqrt());
        }

        let lower = mean.iter().zip(&std_errors).map(|(m, s)| m - z_crit * s).collect();
        let upper = mean.iter().zip(&std_errors).map(|(m, s)| m + z_crit * s).collect();

        Ok(Prediction {
            mean,
            lower,
            upper,
            std_errors,
            alpha,
        })
    }

    /// First `n` ψ-weights of the integrated model, `ψ_0 = 1`.
    pub fn psi_weights(&self, n: usize) -> Vec<f64> {
        // φ*(B) = φ(B)(1 - B)^d, stored as [1, -φ*_1, -φ*_2, ...].
        let mut poly = vec![1.0];
        poly.extend(self.ar.iter().map(|phi| -phi));
        for _ in 0..self.order.d {
            let mut next = vec![0.0; poly.len() + 1];
            for (i, c) in poly.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c;
            }
            poly = next;
        }
        let phi_star: Vec<f64> = poly[1..].iter().map(|c| -c).collect();

        let mut psi = Vec::with_capacity(n);
        for j in 0..n {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = if j <= self.ma.len() { self.ma[j - 1] } else { 0.0 };
            for (i, phi) in phi_star.iter().enumerate().take(j) {
                value += phi * psi[j - 1 - i];
            }
            psi.push(value);
        }
        psi
    }

    /// Human-readable fit report.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "{}{} Model Summary\n",
            self.order,
            if self.with_intercept { " with intercept" } else { "" }
        );
        s.push_str(&"=".repeat(48));
        s.push('\n');
        s.push_str(&format!("No. Observations: {}\n", self.history.len()));
        s.push_str("Method:           CSS\n");
        s.push_str(&"-".repeat(48));
        s.push('\n');
        if self.with_intercept {
            s.push_str(&format!("  intercept = {:>14.6}\n", self.intercept));
        }
        for (i, c) in self.ar.iter().enumerate() {
            s.push_str(&format!("  ar.L{:<6} = {:>14.6}\n", i + 1, c));
        }
        for (i, c) in self.ma.iter().enumerate() {
            s.push_str(&format!("  ma.L{:<6} = {:>14.6}\n", i + 1, c));
        }
        s.push_str(&format!("  sigma2    = {:>14.6}\n", self.sigma2));
        s.push_str(&"-".repeat(48));
        s.push('\n');
        s.push_str(&format!("Log Likelihood: {:.3}\n", self.log_likelihood));
        s.push_str(&format!("AIC:            {:.3}\n", self.aic));
        s.push_str(&format!("BIC:            {:.3}\n", self.bic));
        s
    }
}

// ---------------------------------------------------------------------------
// Estimation helpers
// ---------------------------------------------------------------------------

fn split_params(params: &[f64], p: usize, q: usize, with_intercept: bool) -> (f64, &[f64], &[f64]) {
    let offset = usize::from(with_intercept);
    let mu = if with_intercept { params[0] } else { 0.0 };
    (mu, &params[offset..offset + p], &params[offset + p..offset + p + q])
}

/// Conditional residuals: zero for the first `p` observations.
pub fn css_residuals(w: &[f64], mu: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let n = w.len();
    let p = ar.len();
    let mut e = vec![0.0; n];
    for t in p..n {
        let mut value = w[t] - mu;
        for (i, phi) in ar.iter().enumerate() {
            value -= phi * (w[t - 1 - i] - mu);
        }
        for (j, theta) in ma.iter().enumerate() {
            if t >= p + j + 1 {
                value -= theta * e[t - 1 - j];
            }
        }
        e[t] = value;
    }
    e
}

fn sum_of_squares(e: &[f64], skip: usize) -> f64 {
    e[skip.min(e.len())..].iter().map(|x| x * x).sum()
}

/// Whether `1 - Σ a_k z^k` has all roots outside the unit circle, by the
/// Schur-Cohn step-down recursion.
pub fn is_stationary(coefs: &[f64]) -> bool {
    let mut a = coefs.to_vec();
    while let Some(&r) = a.last() {
        if !r.is_finite() || r.abs() >= 1.0 {
            return false;
        }
        let k = a.len() - 1;
        let denom = 1.0 - r * r;
        a = (0..k).map(|j| (a[j] + r * a[k - 1 - j]) / denom).collect();
    }
    true
}

/// Whether `1 + Σ θ_k z^k` has all roots outside the unit circle.
pub fn is_invertible(coefs: &[f64]) -> bool {
    let negated: Vec<f64> = coefs.iter().map(|c| -c).collect();
    is_stationary(&negated)
}

fn shrink_until_stable(mut coefs: Vec<f64>, check: fn(&[f64]) -> bool) -> Vec<f64> {
    for _ in 0..20 {
        if check(&coefs) {
            return coefs;
        }
        coefs.iter_mut().for_each(|c| *c *= 0.5);
    }
    vec![0.0; coefs.len()]
}

/// Lagged regression of `z_t` on `z_{t-1..p}` and `e_{t-1..q}`.
fn lagged_ols(z: &[f64], e: Option<&[f64]>, p: usize, q: usize, start: usize) -> Option<DVector<f64>> {
    let n = z.len();
    if n <= start {
        return None;
    }
    let rows = n - start;
    let cols = p + q;
    let mut x = Vec::with_capacity(rows * cols);
    for t in start..n {
        for i in 1..=p {
            x.push(z[t - i]);
        }
        if let Some(e) = e {
            for j in 1..=q {
                x.push(e[t - j]);
            }
        }
    }
    let x = DMatrix::from_row_slice(rows, cols, &x);
    let y = DVector::from_column_slice(&z[start..]);
    ols(&x, &y).map(|fit| fit.beta)
}

/// Hannan-Rissanen starting values, falling back to zeros.
fn initial_params(w: &[f64], p: usize, q: usize, with_intercept: bool) -> Vec<f64> {
    let mu = if with_intercept { mean(w) } else { 0.0 };
    let z: Vec<f64> = w.iter().map(|x| x - mu).collect();
    let n = z.len();

    let (ar, ma) = if p + q == 0 {
        (vec![], vec![])
    } else if q == 0 {
        match lagged_ols(&z, None, p, 0, p) {
            Some(beta) => (beta.iter().copied().collect(), vec![]),
            None => (vec![0.0; p], vec![]),
        }
    } else {
        let long = (p + q).max(10).min(n / 4).max(1);
        let estimate = lagged_ols(&z, None, long, 0, long).and_then(|phi| {
            let mut e = vec![0.0; n];
            for t in long..n {
                e[t] = z[t] - (1..=long).map(|i| phi[i - 1] * z[t - i]).sum::<f64>();
            }
            let start = long + q.max(p);
            lagged_ols(&z, Some(&e), p, q, start)
        });
        match estimate {
            Some(beta) => (
                beta.iter().take(p).copied().collect(),
                beta.iter().skip(p).take(q).copied().collect(),
            ),
            None => (vec![0.0; p], vec![0.0; q]),
        }
    };

    let ar = shrink_until_stable(ar, is_stationary);
    let ma = shrink_until_stable(ma, is_invertible);

    let mut params = Vec::with_capacity(usize::from(with_intercept) + p + q);
    if with_intercept {
        params.push(mu);
    }
    params.extend(ar);
    params.extend(ma);
    params
}

fn initial_steps(w: &[f64], p: usize, q: usize, with_intercept: bool) -> Vec<f64> {
    let mut steps = Vec::with_capacity(usize::from(with_intercept) + p + q);
    if with_intercept {
        let sd = sample_std(w);
        steps.push(if sd.is_finite() && sd > 0.0 { 0.1 * sd } else { 0.1 });
    }
    steps.extend(std::iter::repeat(0.1).take(p + q));
    steps
}

/// Undo `d` rounds of differencing, anchoring each round on the last
/// observed value of the corresponding difference of `history`.
fn integrate(forecast: &[f64], history: &[f64], d: usize) -> Vec<f64> {
    let mut result = forecast.to_vec();
    for k in (0..d).rev() {
        let anchor = difference(history, k).last().copied().unwrap_or(0.0);
        let mut level = anchor;
        for value in result.iter_mut() {
            level += *value;
            *value = level;
        }
    }
    result
}
