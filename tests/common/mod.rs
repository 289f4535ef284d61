//! Shared fixtures for the price-forecast integration tests.
//!
//! Deterministic series generators (seeded white noise, AR(1), random walks,
//! exponential growth), dated series builders, a temporary cache, and a
//! scripted `PriceSource` that counts how often it is asked for data.

#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use price_forecast::models::{Observation, PriceSeries};
use price_forecast::render::{Chart, Renderer};
use price_forecast::{CacheManager, FetchRequest, ForecastError, PriceSource, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::cell::Cell;
use std::rc::Rc;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One observation per calendar day starting at `start`.
pub fn daily_series(symbol: &str, start: NaiveDate, values: &[f64]) -> PriceSeries {
    let points = values
        .iter()
        .enumerate()
        .map(|(i, v)| Observation::new(start.checked_add_days(Days::new(i as u64)).unwrap(), *v))
        .collect();
    PriceSeries::new(symbol, points).unwrap()
}

pub fn white_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

/// `x_t = phi x_{t-1} + e_t` after a burn-in of 200 steps.
pub fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
    let noise = white_noise(n + 200, seed);
    let mut x = 0.0;
    let mut out = Vec::with_capacity(n);
    for (t, e) in noise.iter().enumerate() {
        x = phi * x + e;
        if t >= 200 {
            out.push(x);
        }
    }
    out
}

/// `x_t = e_t + theta e_{t-1}`.
pub fn ma1(n: usize, theta: f64, seed: u64) -> Vec<f64> {
    let noise = white_noise(n + 1, seed);
    noise.windows(2).map(|w| w[1] + theta * w[0]).collect()
}

/// Random walk starting at `level`.
pub fn random_walk(n: usize, level: f64, seed: u64) -> Vec<f64> {
    let mut price = level;
    white_noise(n, seed)
        .into_iter()
        .map(|e| {
            price += e;
            price
        })
        .collect()
}

/// Compounding series `x_t = (1 + rate) x_{t-1} + e_t` from 100. Explosive
/// for any positive rate, so no unit-root test can call it stationary.
pub fn exponential_growth(n: usize, rate: f64, seed: u64) -> Vec<f64> {
    let mut price = 100.0;
    white_noise(n, seed)
        .into_iter()
        .map(|e| {
            price = (1.0 + rate) * price + e;
            price
        })
        .collect()
}

/// Cache manager over a fresh temp directory. Keep the `TempDir` alive for
/// the duration of the test.
pub fn temp_cache(file_name: &str) -> (CacheManager, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let cache = CacheManager::new(Some(tmp_dir.path().to_path_buf()), file_name).unwrap();
    (cache, tmp_dir)
}

// ---------------------------------------------------------------------------
// StubSource
// ---------------------------------------------------------------------------

/// What a [`StubSource`] answers with.
#[derive(Clone)]
pub enum StubReply {
    Series(PriceSeries),
    Empty,
    Remote(&'static str),
}

/// Scripted price source. `calls` is shared so tests can inspect it after
/// the source has been boxed.
pub struct StubSource {
    pub reply: StubReply,
    pub calls: Rc<Cell<usize>>,
}

impl StubSource {
    pub fn new(reply: StubReply) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                reply,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl PriceSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    fn fetch(&mut self, request: &FetchRequest) -> Result<PriceSeries> {
        self.calls.set(self.calls.get() + 1);
        match &self.reply {
            StubReply::Series(series) => Ok(series.clone()),
            StubReply::Empty => Ok(PriceSeries::new(&request.symbol, Vec::new())?),
            StubReply::Remote(description) => Err(ForecastError::Remote {
                code: "Not Found".into(),
                description: description.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingRenderer
// ---------------------------------------------------------------------------

/// Keeps every chart it is given.
#[derive(Default)]
pub struct RecordingRenderer {
    pub charts: Vec<Chart>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, chart: &Chart) -> Result<()> {
        self.charts.push(chart.clone());
        Ok(())
    }
}
