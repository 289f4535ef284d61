//! Tests for cache-or-fetch resolution.

mod common;

use common::{daily_series, date, temp_cache, StubReply, StubSource};
use price_forecast::{DataProvider, FetchRequest, ForecastError, Origin};

fn request() -> FetchRequest {
    FetchRequest::new("BTC-USD", date(2024, 1, 1), date(2024, 1, 6))
}

fn sample() -> price_forecast::models::PriceSeries {
    daily_series("BTC-USD", date(2024, 1, 1), &[42000.0, 42500.0, 41800.0, 43000.0, 43250.5])
}

#[test]
fn cold_run_fetches_and_writes_cache() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    let (source, calls) = StubSource::new(StubReply::Series(sample()));
    let mut provider = DataProvider::new(cache, Box::new(source), false);

    let (series, origin) = provider.resolve(&request()).unwrap();

    assert_eq!(origin, Origin::Remote);
    assert_eq!(series, sample());
    assert_eq!(calls.get(), 1);
    assert!(provider.cache().exists());
}

#[test]
fn warm_run_reads_cache_without_fetching() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    let (source, calls) = StubSource::new(StubReply::Series(sample()));
    let mut provider = DataProvider::new(cache, Box::new(source), false);

    provider.resolve(&request()).unwrap();
    let (series, origin) = provider.resolve(&request()).unwrap();

    assert!(matches!(origin, Origin::Cache(stats) if stats.dropped() == 0));
    assert_eq!(series.values(), sample().values());
    assert_eq!(calls.get(), 1);
}

#[test]
fn existing_cache_is_used_whatever_the_range() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    cache.save(&sample()).unwrap();
    let (source, calls) = StubSource::new(StubReply::Empty);
    let mut provider = DataProvider::new(cache, Box::new(source), false);

    let later = FetchRequest::new("BTC-USD", date(2030, 1, 1), date(2031, 1, 1));
    let (series, _) = provider.resolve(&later).unwrap();

    assert_eq!(series.len(), 5);
    assert_eq!(calls.get(), 0);
}

#[test]
fn offline_without_cache_is_not_found() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    let (source, calls) = StubSource::new(StubReply::Series(sample()));
    let mut provider = DataProvider::new(cache, Box::new(source), true);

    let err = provider.resolve(&request()).unwrap_err();

    assert!(matches!(err, ForecastError::NotFound(_)));
    assert_eq!(calls.get(), 0);
    assert!(provider.is_offline());
}

#[test]
fn offline_with_cache_loads_it() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    cache.save(&sample()).unwrap();
    let (source, _) = StubSource::new(StubReply::Empty);
    let mut provider = DataProvider::new(cache, Box::new(source), true);

    let (series, origin) = provider.resolve(&request()).unwrap();
    assert_eq!(series.len(), 5);
    assert!(matches!(origin, Origin::Cache(_)));
}

#[test]
fn empty_download_is_not_cached() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    let (source, _) = StubSource::new(StubReply::Empty);
    let mut provider = DataProvider::new(cache, Box::new(source), false);

    let err = provider.resolve(&request()).unwrap_err();

    assert!(matches!(err, ForecastError::NotFound(_)));
    assert!(!provider.cache().exists());
}

#[test]
fn remote_error_propagates_and_writes_nothing() {
    let (cache, _tmp) = temp_cache("btc_data.csv");
    let (source, calls) = StubSource::new(StubReply::Remote("No data found, symbol may be delisted"));
    let mut provider = DataProvider::new(cache, Box::new(source), false);

    let err = provider.resolve(&request()).unwrap_err();

    assert!(matches!(err, ForecastError::Remote { ref description, .. } if description.contains("delisted")));
    assert_eq!(calls.get(), 1);
    assert!(!provider.cache().exists());
}
