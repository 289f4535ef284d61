//! Local price cache: a two-column `Date,Close` CSV file.
//!
//! The cache is written once on a cold run and read on every run after
//! that. There is no staleness check; delete the file (or call
//! [`CacheManager::clear`]) to force a fresh download. Paths ending in `.gz`
//! are read and written gzip-compressed.

use crate::config::{self, DATE_COLUMN, PRICE_COLUMN};
use crate::error::Result;
use crate::models::{Observation, PriceSeries};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// LoadStats
// ---------------------------------------------------------------------------

/// Row accounting for a single cache load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data rows read, excluding the header line.
    pub total_rows: usize,
    /// Rows whose date field repeated the header literal.
    pub header_rows: usize,
    /// Rows whose date or price failed to coerce.
    pub invalid_rows: usize,
    /// Rows discarded because a later row carried the same date.
    pub duplicate_rows: usize,
}

impl LoadStats {
    pub fn dropped(&self) -> usize {
        self.header_rows + self.invalid_rows + self.duplicate_rows
    }

    pub fn kept(&self) -> usize {
        self.total_rows - self.dropped()
    }
}

// ---------------------------------------------------------------------------
// CacheManager
// ---------------------------------------------------------------------------

/// Reads and writes the on-disk price cache.
pub struct CacheManager {
    /// Directory holding the cache file.
    pub cache_dir: PathBuf,
    /// Full path of the cache file.
    pub path: PathBuf,
}

impl CacheManager {
    /// Create a cache manager for `file_name` inside `cache_dir`.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the cache directory if it does not exist.
    pub fn new(cache_dir: Option<PathBuf>, file_name: &str) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(file_name),
            cache_dir: dir,
        })
    }

    /// Create a cache manager for an explicit file path.
    pub fn at_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cache_dir: dir,
            path,
        })
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn is_gzip(&self) -> bool {
        self.path.extension().and_then(|e| e.to_str()) == Some("gz")
    }

    /// Load the cached series.
    ///
    /// Repeated header rows are filtered first, then every remaining row is
    /// coerced: rows whose date does not parse or whose price is not a
    /// finite non-negative number are dropped and counted, never raised.
    /// The survivors are sorted by date with the last row winning on
    /// duplicate dates.
    pub fn load(&self, symbol: &str) -> Result<(PriceSeries, LoadStats)> {
        let file = File::open(&self.path)?;
        let reader: Box<dyn Read> = if self.is_gzip() {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        let (series, stats) = read_series(reader, symbol)?;

        if stats.dropped() > 0 {
            warn!(
                path = %self.path.display(),
                header_rows = stats.header_rows,
                invalid_rows = stats.invalid_rows,
                duplicate_rows = stats.duplicate_rows,
                "dropped {} of {} cached rows",
                stats.dropped(),
                stats.total_rows
            );
        }
        info!(
            path = %self.path.display(),
            rows = series.len(),
            "loaded price series from cache"
        );
        Ok((series, stats))
    }

    /// Persist `series` as `Date,Close` rows.
    ///
    /// Writes to a temp file in the cache directory first and renames on
    /// success, so an interrupted write never leaves a partial cache behind.
    pub fn save(&self, series: &PriceSeries) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        if self.is_gzip() {
            let encoder = GzEncoder::new(tmp.as_file_mut(), Compression::default());
            let encoder = write_series(encoder, series)?;
            encoder.finish()?;
        } else {
            let file = write_series(tmp.as_file_mut(), series)?;
            file.flush()?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;
        info!(path = %self.path.display(), rows = series.len(), "saved price series to cache");
        Ok(())
    }

    /// Delete the cache file. Returns `true` if a file was removed.
    pub fn clear(&self) -> Result<bool> {
        if self.exists() {
            fs::remove_file(&self.path)?;
            debug!(path = %self.path.display(), "cache file removed");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

// ---------------------------------------------------------------------------
// CSV encoding
// ---------------------------------------------------------------------------

fn write_series<W: Write>(writer: W, series: &PriceSeries) -> Result<W> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([DATE_COLUMN, PRICE_COLUMN])?;
    for point in series.points() {
        csv_writer.write_record([
            point.date.format("%Y-%m-%d").to_string(),
            point.value.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    let inner = csv_writer.into_inner().map_err(|e| e.into_error())?;
    Ok(inner)
}

/// Decode a `Date,Close` CSV stream, dropping rows that fail coercion.
pub fn read_series<R: Read>(reader: R, symbol: &str) -> Result<(PriceSeries, LoadStats)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let date_idx = column_index(&headers, DATE_COLUMN).unwrap_or(0);
    let price_idx = column_index(&headers, PRICE_COLUMN).unwrap_or(1);
    let date_header = headers.get(date_idx).unwrap_or(DATE_COLUMN).to_string();

    let mut stats = LoadStats::default();
    let mut points = Vec::new();

    for record in csv_reader.records() {
        stats.total_rows += 1;
        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!("unreadable cache row: {}", e);
                stats.invalid_rows += 1;
                continue;
            }
        };

        let raw_date = record.get(date_idx).unwrap_or("");
        if raw_date == date_header || raw_date.eq_ignore_ascii_case(DATE_COLUMN) {
            stats.header_rows += 1;
            continue;
        }

        let date = parse_cache_date(raw_date);
        let price = record.get(price_idx).and_then(parse_price);
        match (date, price) {
            (Some(date), Some(price)) => points.push(Observation::new(date, price)),
            _ => stats.invalid_rows += 1,
        }
    }

    let (series, duplicates) = PriceSeries::from_unsorted(symbol, points);
    stats.duplicate_rows = duplicates;
    Ok((series, stats))
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

/// Parse a cached date cell. Accepts `YYYY-MM-DD`, RFC 3339 and
/// `YYYY-MM-DD HH:MM:SS[+TZ]`; only the calendar date is kept.
pub fn parse_cache_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

/// Parse a cached price cell: finite and non-negative, or nothing.
pub fn parse_price(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}
