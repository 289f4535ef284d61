use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SIGNIFICANCE;

// ---------------------------------------------------------------------------
// CriticalValues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

impl CriticalValues {
    /// Label/value pairs in the conventional `1%`, `5%`, `10%` order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("1%", self.one_pct),
            ("5%", self.five_pct),
            ("10%", self.ten_pct),
        ]
        .into_iter()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.iter().find(|(l, _)| *l == label).map(|(_, v)| v)
    }
}

// ---------------------------------------------------------------------------
// StationarityReport
// ---------------------------------------------------------------------------

/// Outcome of an augmented Dickey-Fuller test on one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityReport {
    pub statistic: f64,
    pub p_value: f64,
    pub critical_values: CriticalValues,
    /// Number of lagged differences in the chosen regression.
    pub used_lag: usize,
    /// Observations used in the chosen regression.
    pub n_obs: usize,
    pub is_stationary: bool,
}

impl StationarityReport {
    pub fn new(
        statistic: f64,
        p_value: f64,
        critical_values: CriticalValues,
        used_lag: usize,
        n_obs: usize,
    ) -> Self {
        Self {
            statistic,
            p_value,
            critical_values,
            used_lag,
            n_obs,
            is_stationary: p_value < SIGNIFICANCE,
        }
    }
}

impl fmt::Display for StationarityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ADF Statistics : {}", self.statistic)?;
        writeln!(f, "p-value : {}", self.p_value)?;
        for (label, value) in self.critical_values.iter() {
            writeln!(f, "Critical Value ({}) : {}", label, value)?;
        }
        if self.is_stationary {
            write!(f, "Data is stationary (reject null hypothesis)")
        } else {
            write!(f, "Data is non-stationary (fail to reject null)")
        }
    }
}

// ---------------------------------------------------------------------------
// RollingStats
// ---------------------------------------------------------------------------

/// Rolling mean and standard deviation aligned with the input series.
///
/// Entries before the first full window are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingStats {
    pub window: usize,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}
