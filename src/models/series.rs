use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

fn values_of(points: &[Observation]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

fn dates_of(points: &[Observation]) -> Vec<NaiveDate> {
    points.iter().map(|p| p.date).collect()
}

fn difference_points(points: &[Observation]) -> Vec<Observation> {
    points
        .windows(2)
        .map(|w| Observation::new(w[1].date, w[1].value - w[0].value))
        .collect()
}

// ---------------------------------------------------------------------------
// PriceSeries
// ---------------------------------------------------------------------------

/// An ordered daily price series for one asset.
///
/// Dates are strictly increasing and prices are finite and non-negative.
/// Gaps in the calendar are kept as gaps; nothing is imputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    points: Vec<Observation>,
}

impl PriceSeries {
    /// Build a series from points that must already satisfy the invariants.
    pub fn new(symbol: &str, points: Vec<Observation>) -> Result<Self> {
        for (i, p) in points.iter().enumerate() {
            if !p.value.is_finite() || p.value < 0.0 {
                return Err(ForecastError::InvalidArgument(format!(
                    "price at {} is not a finite non-negative number: {}",
                    p.date, p.value
                )));
            }
            if i > 0 && points[i - 1].date >= p.date {
                return Err(ForecastError::InvalidArgument(format!(
                    "dates must be strictly increasing ({} then {})",
                    points[i - 1].date, p.date
                )));
            }
        }
        Ok(Self {
            symbol: symbol.to_string(),
            points,
        })
    }

    /// Build a series from arbitrary rows: sort by date and keep the last row
    /// for each repeated date.
    ///
    /// Returns the series and the number of duplicate rows discarded. Rows
    /// with invalid prices must be filtered out by the caller.
    pub fn from_unsorted(symbol: &str, mut points: Vec<Observation>) -> (Self, usize) {
        // Stable sort keeps input order within a date, so the last one wins.
        points.sort_by_key(|p| p.date);
        let before = points.len();
        let mut deduped: Vec<Observation> = Vec::with_capacity(before);
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => deduped.push(p),
            }
        }
        let dropped = before - deduped.len();
        (
            Self {
                symbol: symbol.to_string(),
                points: deduped,
            },
            dropped,
        )
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        values_of(&self.points)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        dates_of(&self.points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.points.last()
    }

    /// First-order difference; the first point has no predecessor and is dropped.
    pub fn difference(&self) -> DifferencedSeries {
        DifferencedSeries {
            symbol: self.symbol.clone(),
            order: 1,
            points: difference_points(&self.points),
        }
    }
}

// ---------------------------------------------------------------------------
// DifferencedSeries
// ---------------------------------------------------------------------------

/// A [`PriceSeries`] differenced `order` times.
///
/// Each point carries the date of the later of the two observations it was
/// computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferencedSeries {
    pub symbol: String,
    pub order: usize,
    points: Vec<Observation>,
}

impl DifferencedSeries {
    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        values_of(&self.points)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        dates_of(&self.points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Difference once more.
    pub fn difference(&self) -> DifferencedSeries {
        DifferencedSeries {
            symbol: self.symbol.clone(),
            order: self.order + 1,
            points: difference_points(&self.points),
        }
    }
}

/// Difference a plain slice `d` times. Returns an empty vector when the
/// input is too short.
pub fn difference(values: &[f64], d: usize) -> Vec<f64> {
    let mut result = values.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}
