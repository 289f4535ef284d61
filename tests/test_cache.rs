//! Tests for the CSV price cache: coercion, header filtering, persistence.

mod common;

use common::{daily_series, date, temp_cache};
use price_forecast::cache::{parse_cache_date, parse_price, read_series};
use price_forecast::{CacheManager, ForecastError};
use std::fs;
use std::io::Read;

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn repeated_header_rows_are_filtered() {
    let csv = "Date,Close\nDate,Date\n2024-01-01,100\n2024-01-02,101.5\n";
    let (series, stats) = read_series(csv.as_bytes(), "BTC-USD").unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.values(), vec![100.0, 101.5]);
    assert_eq!(stats.total_rows, 3);
    assert_eq!(stats.header_rows, 1);
    assert_eq!(stats.invalid_rows, 0);
    assert_eq!(stats.kept(), 2);
}

#[test]
fn multi_line_download_header_is_tolerated() {
    // Layout written by some download tools: a ticker line and an empty
    // "Date" line under the column header.
    let csv = "Price,Close\nTicker,BTC-USD\nDate,\n2024-01-01,42000.5\n2024-01-02,42500\n";
    let (series, stats) = read_series(csv.as_bytes(), "BTC-USD").unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(stats.header_rows, 1);
    assert_eq!(stats.invalid_rows, 1);
    assert_eq!(stats.dropped(), 2);
}

#[test]
fn invalid_rows_are_dropped_not_raised() {
    let csv = "Date,Close\n\
               2024-01-01,100\n\
               not-a-date,101\n\
               2024-01-03,abc\n\
               2024-01-04,\n\
               2024-01-05,-5\n\
               2024-01-06,NaN\n\
               2024-01-07,107\n";
    let (series, stats) = read_series(csv.as_bytes(), "X").unwrap();

    assert_eq!(series.dates(), vec![date(2024, 1, 1), date(2024, 1, 7)]);
    assert_eq!(stats.total_rows, 7);
    assert_eq!(stats.invalid_rows, 5);
}

#[test]
fn rows_are_sorted_and_duplicate_dates_keep_the_last() {
    let csv = "Date,Close\n2024-01-03,3\n2024-01-01,1\n2024-01-03,33\n2024-01-02,2\n";
    let (series, stats) = read_series(csv.as_bytes(), "X").unwrap();

    assert_eq!(series.values(), vec![1.0, 2.0, 33.0]);
    assert_eq!(stats.duplicate_rows, 1);
}

#[test]
fn columns_are_found_by_name() {
    let csv = "Open,Close,Date\n1,100,2024-01-01\n2,200,2024-01-02\n";
    let (series, _) = read_series(csv.as_bytes(), "X").unwrap();
    assert_eq!(series.values(), vec![100.0, 200.0]);
    assert_eq!(series.first().unwrap().date, date(2024, 1, 1));
}

#[test]
fn header_only_file_yields_empty_series() {
    let (series, stats) = read_series("Date,Close\n".as_bytes(), "X").unwrap();
    assert!(series.is_empty());
    assert_eq!(stats.total_rows, 0);
}

#[test]
fn date_cells_accept_timestamps() {
    assert_eq!(parse_cache_date("2024-02-29"), Some(date(2024, 2, 29)));
    assert_eq!(parse_cache_date("2024-02-29 00:00:00+00:00"), Some(date(2024, 2, 29)));
    assert_eq!(parse_cache_date("2024-02-29T00:00:00Z"), Some(date(2024, 2, 29)));
    assert_eq!(parse_cache_date("2024-02-29 12:30:00"), Some(date(2024, 2, 29)));
    assert_eq!(parse_cache_date("Date"), None);
    assert_eq!(parse_cache_date(""), None);
}

#[test]
fn price_cells_must_be_finite_and_non_negative() {
    assert_eq!(parse_price(" 42.5 "), Some(42.5));
    assert_eq!(parse_price("0"), Some(0.0));
    assert_eq!(parse_price("-1"), None);
    assert_eq!(parse_price("inf"), None);
    assert_eq!(parse_price("BTC-USD"), None);
}

// ---------------------------------------------------------------------------
// CacheManager
// ---------------------------------------------------------------------------

#[test]
fn save_then_load_round_trips() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    let series = daily_series("BTC-USD", date(2024, 1, 1), &[42000.5, 42100.25, 41999.125]);

    assert!(!cache.exists());
    cache.save(&series).unwrap();
    assert!(cache.exists());

    let (loaded, stats) = cache.load("BTC-USD").unwrap();
    assert_eq!(loaded, series);
    assert_eq!(stats.dropped(), 0);
}

#[test]
fn saved_file_has_date_close_header() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    cache
        .save(&daily_series("BTC-USD", date(2024, 1, 1), &[1.5, 2.5]))
        .unwrap();

    let contents = fs::read_to_string(&cache.path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("Date,Close"));
    assert_eq!(lines.next(), Some("2024-01-01,1.5"));
    assert_eq!(lines.next(), Some("2024-01-02,2.5"));
}

#[test]
fn save_leaves_no_temp_files_behind() {
    let (cache, tmp) = temp_cache("btc_data.csv");
    cache
        .save(&daily_series("BTC-USD", date(2024, 1, 1), &[1.0, 2.0]))
        .unwrap();
    let entries = fs::read_dir(tmp.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn gzip_cache_is_compressed_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = CacheManager::at_path(tmp.path().join("prices.csv.gz")).unwrap();
    let series = daily_series("ETH-USD", date(2023, 6, 1), &[1800.0, 1810.0, 1795.5]);

    cache.save(&series).unwrap();

    let mut magic = [0u8; 2];
    fs::File::open(&cache.path)
        .unwrap()
        .read_exact(&mut magic)
        .unwrap();
    assert_eq!(magic, [0x1f, 0x8b]);

    let (loaded, _) = cache.load("ETH-USD").unwrap();
    assert_eq!(loaded.values(), series.values());
}

#[test]
fn at_path_creates_parent_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("dir").join("btc_data.csv");
    let cache = CacheManager::at_path(&path).unwrap();
    assert!(tmp.path().join("nested").join("dir").is_dir());
    assert_eq!(cache.path, path);
}

#[test]
fn load_missing_file_is_io_error() {
    let (cache, _tmp) = temp_cache("missing.csv");
    assert!(matches!(cache.load("X"), Err(ForecastError::Io(_))));
}

#[test]
fn clear_removes_the_file_once() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    cache
        .save(&daily_series("BTC-USD", date(2024, 1, 1), &[1.0]))
        .unwrap();

    assert!(cache.clear().unwrap());
    assert!(!cache.exists());
    assert!(!cache.clear().unwrap());
}
