use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; price-forecast/0.1)";

pub const DEFAULT_SYMBOL: &str = "BTC-USD";
pub const DEFAULT_START: &str = "2020-01-01";
/// Exclusive upper bound, as the remote source treats it.
pub const DEFAULT_END: &str = "2025-01-01";
pub const CACHE_FILE_NAME: &str = "btc_data.csv";

/// Cache file column headers.
pub const DATE_COLUMN: &str = "Date";
pub const PRICE_COLUMN: &str = "Close";

pub const ROLLING_WINDOW: usize = 30;
/// Fixed ADF significance threshold. Not user-configurable.
pub const SIGNIFICANCE: f64 = 0.05;
pub const FORECAST_HORIZON: usize = 30;
pub const CORRELATION_LAGS: usize = 40;
pub const CONFIDENCE_LEVEL: f64 = 0.95;

pub const MAX_P: usize = 5;
pub const MAX_Q: usize = 5;
pub const MAX_D: usize = 2;
pub const MAX_ORDER: usize = 5;
pub const MAX_FITS: usize = 100;

pub const HTTP_TIMEOUT_SECS: u64 = 120;

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("price-forecast")
    } else {
        PathBuf::from(".price-forecast-cache")
    }
}

/// Cache file name for a symbol: `btc_data.csv` for the default symbol,
/// `<symbol>_data.csv` (lowercased, non-alphanumerics as `_`) otherwise.
pub fn cache_file_name(symbol: &str) -> String {
    if symbol == DEFAULT_SYMBOL {
        return CACHE_FILE_NAME.to_string();
    }
    let stem: String = symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_data.csv", stem)
}

/// [`cache_file_name`] with an optional source tag in front, as in
/// `synthetic_btc_data.csv`.
pub fn tagged_cache_file_name(symbol: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("{}_{}", tag, cache_file_name(symbol)),
        None => cache_file_name(symbol),
    }
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ForecastError::InvalidArgument(format!("expected YYYY-MM-DD, got '{}': {}", value, e))
    })
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Tunable parameters of a single analysis run.
///
/// Defaults reproduce the reference run (BTC-USD, 2020 through 2024, 30-day
/// window, 30-day horizon). Can be loaded from a JSON file; missing fields
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub window: usize,
    pub horizon: usize,
    pub lags: usize,
    pub confidence: f64,
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            window: ROLLING_WINDOW,
            horizon: FORECAST_HORIZON,
            lags: CORRELATION_LAGS,
            confidence: CONFIDENCE_LEVEL,
            max_p: MAX_P,
            max_q: MAX_Q,
            max_d: MAX_D,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ForecastError::InvalidArgument("symbol must not be empty".into()));
        }
        if self.start >= self.end {
            return Err(ForecastError::InvalidArgument(format!(
                "start {} must be before end {}",
                self.start, self.end
            )));
        }
        if self.window < 2 {
            return Err(ForecastError::InvalidArgument("window must be at least 2".into()));
        }
        if self.horizon == 0 {
            return Err(ForecastError::InvalidArgument("horizon must be positive".into()));
        }
        if !(0.0 < self.confidence && self.confidence < 1.0) {
            return Err(ForecastError::InvalidArgument(format!(
                "confidence must be in (0, 1), got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}
