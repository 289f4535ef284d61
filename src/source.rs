//! Remote price sources.
//!
//! [`YahooSource`] pulls daily bars from the Yahoo Finance chart endpoint.
//! [`SyntheticSource`] generates a seeded random walk for offline runs.

use crate::config;
use crate::error::{ForecastError, Result};
use crate::models::{Observation, PriceSeries};
use chrono::{DateTime, Days, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Asset and date range to fetch. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchRequest {
    pub fn new(symbol: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            start,
            end,
        }
    }
}

/// Anything that can produce a daily price series for a symbol and range.
pub trait PriceSource {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Fetch the series. Rows without a price are dropped; failures propagate.
    fn fetch(&mut self, request: &FetchRequest) -> Result<PriceSeries>;

    /// Prefix for the default cache file name. Sources that do not return
    /// real market data set one so they never share a cache with those that do.
    fn cache_tag(&self) -> Option<&str> {
        None
    }
}

// ---------------------------------------------------------------------------
// Yahoo chart response
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Collapse a chart response into a single price column.
///
/// The adjusted close is used when present, the raw close otherwise.
/// Entries with a null or invalid price are dropped.
pub fn parse_chart(body: &str, symbol: &str) -> Result<PriceSeries> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        return Err(ForecastError::Remote {
            code: err.code,
            description: err.description,
        });
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ForecastError::NotFound(format!("no chart data returned for {}", symbol)))?;

    let prices: Vec<Option<f64>> = match data.indicators.adjclose.into_iter().next() {
        Some(block) if !block.adjclose.is_empty() => block.adjclose,
        _ => data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default(),
    };

    let mut points = Vec::with_capacity(data.timestamp.len());
    for (ts, price) in data.timestamp.iter().zip(prices) {
        let Some(price) = price.filter(|p| p.is_finite() && *p >= 0.0) else {
            continue;
        };
        let Some(dt) = DateTime::from_timestamp(*ts, 0) else {
            continue;
        };
        points.push(Observation::new(dt.date_naive(), price));
    }

    let (series, duplicates) = PriceSeries::from_unsorted(symbol, points);
    if duplicates > 0 {
        debug!(symbol, duplicates, "collapsed duplicate dates in chart response");
    }
    Ok(series)
}

// ---------------------------------------------------------------------------
// YahooSource
// ---------------------------------------------------------------------------

/// Fetches daily prices from the Yahoo Finance chart API.
pub struct YahooSource {
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
}

impl YahooSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            base_url: config::YAHOO_CHART_URL.to_string(),
            timeout,
            client: None,
        }
    }

    /// Point the source at a different chart endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<&Client> {
        if self.client.is_none() {
            let client = Client::builder()
                .timeout(self.timeout)
                .user_agent(config::USER_AGENT)
                .build()?;
            self.client = Some(client);
        }
        self.client
            .as_ref()
            .ok_or_else(|| ForecastError::InvalidArgument("HTTP client unavailable".into()))
    }

    fn chart_url(&self, request: &FetchRequest) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ForecastError::InvalidArgument(format!("bad chart URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ForecastError::InvalidArgument(format!("chart URL cannot be a base: {}", self.base_url))
            })?
            .push(&request.symbol);

        let period1 = day_start_timestamp(request.start);
        let period2 = day_start_timestamp(request.end);
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");
        Ok(url)
    }
}

impl Default for YahooSource {
    fn default() -> Self {
        Self::new(Duration::from_secs(config::HTTP_TIMEOUT_SECS))
    }
}

impl PriceSource for YahooSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn fetch(&mut self, request: &FetchRequest) -> Result<PriceSeries> {
        let url = self.chart_url(request)?;
        info!(symbol = %request.symbol, start = %request.start, end = %request.end, "downloading {}", url);

        let client = self.client()?.clone();
        let resp = client.get(url).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            // The chart API reports bad symbols as a JSON error payload.
            if let Err(e @ ForecastError::Remote { .. }) = parse_chart(&body, &request.symbol) {
                return Err(e);
            }
            return Err(ForecastError::Remote {
                code: status.as_u16().to_string(),
                description: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }
        parse_chart(&body, &request.symbol)
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// SyntheticSource
// ---------------------------------------------------------------------------

/// Deterministic geometric random walk, one point per calendar day.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub seed: u64,
    pub start_price: f64,
    /// Mean daily log return.
    pub drift: f64,
    /// Standard deviation of daily log returns.
    pub volatility: f64,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self {
            seed: 42,
            start_price: 7_200.0,
            drift: 0.0015,
            volatility: 0.035,
        }
    }
}

impl PriceSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn cache_tag(&self) -> Option<&str> {
        Some("synthetic")
    }

    fn fetch(&mut self, request: &FetchRequest) -> Result<PriceSeries> {
        if request.start >= request.end {
            return Err(ForecastError::InvalidArgument(format!(
                "start {} must be before end {}",
                request.start, request.end
            )));
        }
        let noise = Normal::new(self.drift, self.volatility).map_err(|e| {
            ForecastError::InvalidArgument(format!("invalid synthetic volatility: {}", e))
        })?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut points = Vec::new();
        let mut price = self.start_price;
        let mut date = request.start;
        while date < request.end {
            points.push(Observation::new(date, price));
            price *= noise.sample(&mut rng).exp();
            date = match date.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }
        PriceSeries::new(&request.symbol, points)
    }
}
