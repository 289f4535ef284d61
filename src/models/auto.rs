//! Stepwise ARIMA order search.
//!
//! The differencing order comes from repeated KPSS tests. The AR and MA
//! orders are then searched stepwise: a handful of starting models are
//! fitted, and the search moves to whichever ±1 neighbour of the current
//! best lowers the AIC, until no neighbour does.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::analysis::kpss::ndiffs;
use crate::config;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaModel, ArimaOrder};

/// One model tried during the search. `aic` is `None` when the fit failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub order: ArimaOrder,
    pub with_intercept: bool,
    pub aic: Option<f64>,
}

/// The selected model and the trail of candidates that led to it.
#[derive(Debug, Clone)]
pub struct AutoArimaFit {
    pub model: ArimaModel,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone)]
pub struct AutoArima {
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
    /// Upper bound on `p + q`.
    pub max_order: usize,
    pub max_fits: usize,
    pub start_p: usize,
    pub start_q: usize,
    /// Significance level of the KPSS tests choosing `d`.
    pub test_alpha: f64,
    /// Use this `d` instead of testing for it.
    pub d: Option<usize>,
}

impl Default for AutoArima {
    fn default() -> Self {
        Self {
            max_p: config::MAX_P,
            max_q: config::MAX_Q,
            max_d: config::MAX_D,
            max_order: config::MAX_ORDER,
            max_fits: config::MAX_FITS,
            start_p: 2,
            start_q: 2,
            test_alpha: 0.05,
            d: None,
        }
    }
}

struct Search<'a> {
    data: &'a [f64],
    d: usize,
    tried: HashSet<(usize, usize, bool)>,
    candidates: Vec<Candidate>,
    best: Option<ArimaModel>,
}

impl Search<'_> {
    /// Fit one candidate unless already tried. Returns `true` if it became the best.
    fn try_fit(&mut self, p: usize, q: usize, with_intercept: bool) -> bool {
        if !self.tried.insert((p, q, with_intercept)) {
            return false;
        }
        let order = ArimaOrder::new(p, self.d, q);
        let fit = ArimaModel::fit(self.data, order, with_intercept);
        let aic = fit.as_ref().ok().map(|m| m.aic);
        match (&fit, aic) {
            (Ok(_), Some(aic)) => debug!(%order, intercept = with_intercept, aic, "candidate fitted"),
            (Err(e), _) => debug!(%order, intercept = with_intercept, error = %e, "candidate skipped"),
            _ => {}
        }
        self.candidates.push(Candidate {
            order,
            with_intercept,
            aic,
        });

        let Ok(model) = fit else {
            return false;
        };
        let improves = self.best.as_ref().map_or(true, |b| model.aic < b.aic);
        if improves {
            self.best = Some(model);
        }
        improves
    }
}

impl AutoArima {
    /// Choose `d`, search `(p, q)` and the intercept, and return the best fit.
    pub fn fit(&self, data: &[f64]) -> Result<AutoArimaFit> {
        if data.iter().any(|x| !x.is_finite()) {
            return Err(ForecastError::InvalidArgument(
                "series contains NaN or infinite values".into(),
            ));
        }
        let d = self
            .d
            .unwrap_or_else(|| ndiffs(data, self.test_alpha, self.max_d));
        info!(d, "differencing order selected by KPSS");

        // A mean is identifiable for d = 0 and a drift for d = 1.
        let allow_intercept = d <= 1;
        let mut search = Search {
            data,
            d,
            tried: HashSet::new(),
            candidates: Vec::new(),
            best: None,
        };

        let starts = [
            (self.start_p.min(self.max_p), self.start_q.min(self.max_q)),
            (0, 0),
            (1.min(self.max_p), 0),
            (0, 1.min(self.max_q)),
        ];
        for (p, q) in starts {
            if p + q <= self.max_order && search.candidates.len() < self.max_fits {
                search.try_fit(p, q, allow_intercept);
            }
        }
        if allow_intercept && search.candidates.len() < self.max_fits {
            search.try_fit(0, 0, false);
        }

        while search.candidates.len() < self.max_fits {
            let Some(best) = search.best.as_ref() else {
                break;
            };
            let (p, q, c) = (best.order.p, best.order.q, best.with_intercept);

            let mut moved = false;
            for (np, nq, nc) in self.neighbours(p, q, c, allow_intercept) {
                if search.candidates.len() >= self.max_fits {
                    break;
                }
                if search.try_fit(np, nq, nc) {
                    moved = true;
                    break;
                }
            }
            if !moved {
                break;
            }
        }

        let candidates = search.candidates;
        let model = search.best.ok_or_else(|| {
            ForecastError::ModelFit(format!(
                "no ARIMA candidate could be fitted ({} tried)",
                candidates.len()
            ))
        })?;
        info!(
            order = %model.order,
            intercept = model.with_intercept,
            aic = model.aic,
            fits = candidates.len(),
            "best model selected"
        );
        Ok(AutoArimaFit { model, candidates })
    }

    fn neighbours(&self, p: usize, q: usize, c: bool, allow_intercept: bool) -> Vec<(usize, usize, bool)> {
        let deltas: [(i64, i64); 8] = [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, 1), (-1, 1), (1, -1)];
        let mut out: Vec<(usize, usize, bool)> = deltas
            .iter()
            .filter_map(|(dp, dq)| {
                let np = p as i64 + dp;
                let nq = q as i64 + dq;
                if np < 0 || nq < 0 {
                    return None;
                }
                let (np, nq) = (np as usize, nq as usize);
                (np <= self.max_p && nq <= self.max_q && np + nq <= self.max_order)
                    .then_some((np, nq, c))
            })
            .collect();
        if allow_intercept {
            out.push((p, q, !c));
        }
        out
    }
}
