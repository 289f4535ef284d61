//! Daily price analysis and ARIMA forecasting.
//!
//! Resolves a price series from a local CSV cache (or downloads it and
//! writes the cache on the first run), tests it for stationarity before and
//! after first differencing, inspects its autocorrelation, selects an ARIMA
//! order by AIC, and forecasts a fixed horizon of daily prices.
//!
//! Charts are never drawn directly: every stage describes its figure as a
//! [`render::Chart`] and hands it to the configured [`Renderer`].
//!
//! # Quick start
//!
//! ```no_run
//! use price_forecast::PriceForecast;
//!
//! let mut app = PriceForecast::builder().build().unwrap();
//! let report = app.run().unwrap();
//!
//! println!("{}", report.raw.report);
//! for point in &report.forecast.points {
//!     println!("{} {:.2}", point.date, point.mean);
//! }
//! ```

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod optim;
pub mod pipeline;
pub mod provider;
pub mod render;
pub mod source;

pub use cache::{CacheManager, LoadStats};
pub use config::PipelineConfig;
pub use error::{ForecastError, Result};
pub use pipeline::AnalysisReport;
pub use provider::{DataProvider, Origin};
pub use render::{NullRenderer, Renderer};
pub use source::{FetchRequest, PriceSource, SyntheticSource, YahooSource};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use analysis::{StationarityOutcome, StationarityTester};
use models::{Observation, PriceSeries};

// ---------------------------------------------------------------------------
// PriceForecastBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`PriceForecast`] instance.
///
/// Use [`PriceForecast::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](PriceForecastBuilder::build).
pub struct PriceForecastBuilder {
    cache_dir: Option<PathBuf>,
    cache_file: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    config: PipelineConfig,
    source: Option<Box<dyn PriceSource>>,
    renderer: Option<Box<dyn Renderer>>,
}

impl Default for PriceForecastBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_file: None,
            offline: false,
            timeout: Duration::from_secs(config::HTTP_TIMEOUT_SECS),
            config: PipelineConfig::default(),
            source: None,
            renderer: None,
        }
    }
}

impl PriceForecastBuilder {
    /// Set a custom cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/price-forecast` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use an explicit cache file path. Takes precedence over
    /// [`cache_dir`](Self::cache_dir).
    pub fn cache_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, the remote source is never contacted and a missing
    /// cache file is an error. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout for the default remote source.
    ///
    /// Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the whole run configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a different remote source. Defaults to [`YahooSource`].
    pub fn source<S: PriceSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Send charts to `renderer`. Defaults to [`NullRenderer`].
    pub fn renderer<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Validate the configuration and set up the cache location.
    ///
    /// Nothing is downloaded here; the series is resolved on the first call
    /// to [`PriceForecast::load_series`] or [`PriceForecast::run`].
    pub fn build(self) -> Result<PriceForecast> {
        self.config.validate()?;
        let timeout = self.timeout;
        let source = self
            .source
            .unwrap_or_else(|| Box::new(YahooSource::new(timeout)));
        let cache = match self.cache_file {
            Some(path) => CacheManager::at_path(path)?,
            None => {
                let name = config::tagged_cache_file_name(&self.config.symbol, source.cache_tag());
                CacheManager::new(self.cache_dir, &name)?
            }
        };
        Ok(PriceForecast {
            provider: DataProvider::new(cache, source, self.offline),
            config: self.config,
            renderer: self.renderer.unwrap_or_else(|| Box::new(NullRenderer)),
        })
    }
}

// ---------------------------------------------------------------------------
// PriceForecast
// ---------------------------------------------------------------------------

/// The main entry point: a configured data provider, run settings and a
/// chart renderer.
///
/// Created via [`PriceForecast::builder()`].
pub struct PriceForecast {
    provider: DataProvider,
    config: PipelineConfig,
    renderer: Box<dyn Renderer>,
}

impl PriceForecast {
    /// Create a new builder for configuring the analysis.
    pub fn builder() -> PriceForecastBuilder {
        PriceForecastBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        self.provider.cache()
    }

    /// Resolve the configured series from the cache or the remote source.
    pub fn load_series(&mut self) -> Result<(PriceSeries, Origin)> {
        let request = FetchRequest::new(&self.config.symbol, self.config.start, self.config.end);
        self.provider.resolve(&request)
    }

    /// Run the stationarity test on any dated series, rendering its chart.
    pub fn test_stationarity(&mut self, title: &str, points: &[Observation]) -> Result<StationarityOutcome> {
        StationarityTester::new(self.config.window).test(title, points, self.renderer.as_mut())
    }

    /// Run the whole analysis.
    pub fn run(&mut self) -> Result<AnalysisReport> {
        pipeline::run(&mut self.provider, &self.config, self.renderer.as_mut())
    }

    /// Delete the cache file. Returns `true` if one existed.
    pub fn clear_cache(&self) -> Result<bool> {
        self.provider.cache().clear()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for PriceForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PriceForecast(symbol={}, range={}..{}, cache={}, offline={})",
            self.config.symbol,
            self.config.start,
            self.config.end,
            self.provider.cache().path.display(),
            self.provider.is_offline()
        )
    }
}
