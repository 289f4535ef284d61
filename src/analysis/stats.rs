//! Descriptive statistics and ordinary least squares.

use nalgebra::{DMatrix, DVector};

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance (divides by `n`).
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (divides by `n - 1`).
pub fn sample_std(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return f64::NAN;
    }
    let m = mean(data);
    let ss: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (data.len() - 1) as f64).sqrt()
}

pub fn is_constant(data: &[f64]) -> bool {
    match data.first() {
        Some(first) => data.iter().all(|x| x == first),
        None => true,
    }
}

// ---------------------------------------------------------------------------
// OLS
// ---------------------------------------------------------------------------

/// Result of an ordinary least squares regression.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub beta: DVector<f64>,
    pub std_errors: Vec<f64>,
    pub residuals: DVector<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
    pub nobs: usize,
    pub k: usize,
}

impl OlsFit {
    /// Gaussian log-likelihood at the OLS estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.k as f64
    }

    pub fn t_value(&self, i: usize) -> f64 {
        self.beta[i] / self.std_errors[i]
    }
}

/// Fit `y = X β` by least squares.
///
/// Returns `None` when `X'X` is singular or there are no residual degrees
/// of freedom.
pub fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let (nobs, k) = x.shape();
    if nobs <= k || y.len() != nobs {
        return None;
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * x).try_inverse()?;
    let beta = &xtx_inv * (&xt * y);
    let residuals = y - x * &beta;
    let ssr = residuals.dot(&residuals);
    let mse = ssr / (nobs - k) as f64;
    let std_errors = (0..k).map(|i| (mse * xtx_inv[(i, i)]).sqrt()).collect();

    Some(OlsFit {
        beta,
        std_errors,
        residuals,
        ssr,
        nobs,
        k,
    })
}
