use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Point forecasts with confidence intervals, dated one calendar day apart
/// starting the day after the last observed date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub confidence: f64,
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Attach daily dates to raw model output.
    pub fn from_predictions(
        last_date: NaiveDate,
        confidence: f64,
        mean: &[f64],
        lower: &[f64],
        upper: &[f64],
    ) -> Result<Self> {
        if mean.len() != lower.len() || mean.len() != upper.len() {
            return Err(ForecastError::InvalidArgument(format!(
                "forecast arrays differ in length ({}, {}, {})",
                mean.len(),
                lower.len(),
                upper.len()
            )));
        }
        let mut points = Vec::with_capacity(mean.len());
        for i in 0..mean.len() {
            let date = last_date
                .checked_add_days(Days::new(i as u64 + 1))
                .ok_or_else(|| {
                    ForecastError::InvalidArgument(format!(
                        "forecast date overflow after {}",
                        last_date
                    ))
                })?;
            points.push(ForecastPoint {
                date,
                mean: mean[i],
                lower: lower[i],
                upper: upper[i],
            });
        }
        Ok(Self { confidence, points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}
