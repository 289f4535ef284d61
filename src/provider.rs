//! Cache-or-fetch resolution of a [`PriceSeries`].

use crate::cache::{CacheManager, LoadStats};
use crate::error::{ForecastError, Result};
use crate::models::PriceSeries;
use crate::source::{FetchRequest, PriceSource};
use tracing::{info, warn};

/// Where a resolved series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Read from an existing cache file.
    Cache(LoadStats),
    /// Downloaded from the remote source and written to the cache.
    Remote,
}

/// Resolves a price series from the cache file, falling back to a remote
/// source on a cold run.
///
/// The cache is never refreshed: once written it is reused until the file is
/// deleted, whatever date range is requested.
pub struct DataProvider {
    cache: CacheManager,
    source: Box<dyn PriceSource>,
    offline: bool,
}

impl DataProvider {
    pub fn new(cache: CacheManager, source: Box<dyn PriceSource>, offline: bool) -> Self {
        Self {
            cache,
            source,
            offline,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Produce the series for `request`.
    ///
    /// A present cache file wins. Otherwise the series is fetched, rows
    /// without a price are dropped, and the result is written to the cache
    /// before being returned. Offline mode refuses to fetch.
    pub fn resolve(&mut self, request: &FetchRequest) -> Result<(PriceSeries, Origin)> {
        if self.cache.exists() {
            info!(path = %self.cache.path.display(), "loading from cache");
            let (series, stats) = self.cache.load(&request.symbol)?;
            if series.is_empty() {
                warn!(path = %self.cache.path.display(), "cache file holds no valid rows");
            }
            return Ok((series, Origin::Cache(stats)));
        }

        if self.offline {
            return Err(ForecastError::NotFound(format!(
                "cache file {} does not exist and offline mode is enabled",
                self.cache.path.display()
            )));
        }

        info!(source = self.source.name(), symbol = %request.symbol, "cache miss, fetching");
        let series = self.source.fetch(request)?;
        if series.is_empty() {
            return Err(ForecastError::NotFound(format!(
                "{} returned no prices for {} between {} and {}",
                self.source.name(),
                request.symbol,
                request.start,
                request.end
            )));
        }
        self.cache.save(&series)?;
        Ok((series, Origin::Remote))
    }
}
