//! Tests for run configuration loading and validation.

mod common;

use common::date;
use price_forecast::config::{
    cache_file_name, parse_date, tagged_cache_file_name, PipelineConfig, CACHE_FILE_NAME,
};
use price_forecast::ForecastError;
use std::io::Write;

#[test]
fn defaults_reproduce_reference_run() {
    let config = PipelineConfig::default();
    assert_eq!(config.symbol, "BTC-USD");
    assert_eq!(config.start, date(2020, 1, 1));
    assert_eq!(config.end, date(2025, 1, 1));
    assert_eq!(config.window, 30);
    assert_eq!(config.horizon, 30);
    assert_eq!(config.lags, 40);
    assert_eq!(config.confidence, 0.95);
    assert!(config.validate().is_ok());
}

#[test]
fn partial_file_falls_back_to_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"symbol": "ETH-USD", "start": "2022-06-01", "horizon": 14}}"#).unwrap();

    let config = PipelineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.symbol, "ETH-USD");
    assert_eq!(config.start, date(2022, 6, 1));
    assert_eq!(config.horizon, 14);
    assert_eq!(config.end, date(2025, 1, 1));
    assert_eq!(config.window, 30);
}

#[test]
fn invalid_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"window": 1}}"#).unwrap();
    assert!(matches!(
        PipelineConfig::from_file(file.path()),
        Err(ForecastError::InvalidArgument(_))
    ));

    let mut garbage = tempfile::NamedTempFile::new().unwrap();
    write!(garbage, "not json").unwrap();
    assert!(matches!(
        PipelineConfig::from_file(garbage.path()),
        Err(ForecastError::Json(_))
    ));
}

#[test]
fn validate_checks_each_field() {
    let bad = [
        PipelineConfig { symbol: " ".into(), ..Default::default() },
        PipelineConfig { end: date(2019, 1, 1), ..Default::default() },
        PipelineConfig { horizon: 0, ..Default::default() },
        PipelineConfig { confidence: 1.0, ..Default::default() },
        PipelineConfig { confidence: 0.0, ..Default::default() },
    ];
    for config in bad {
        assert!(config.validate().is_err(), "{:?}", config);
    }
}

#[test]
fn date_arguments_parse() {
    assert_eq!(parse_date("2025-01-01").unwrap(), date(2025, 1, 1));
    assert!(parse_date("01/01/2025").is_err());
}

#[test]
fn cache_file_is_named_after_the_symbol() {
    assert_eq!(cache_file_name("BTC-USD"), CACHE_FILE_NAME);
    assert_eq!(cache_file_name("ETH-USD"), "eth_usd_data.csv");
    assert_eq!(cache_file_name("^GSPC"), "_gspc_data.csv");
}

#[test]
fn tagged_cache_file_keeps_sources_apart() {
    assert_eq!(tagged_cache_file_name("BTC-USD", None), "btc_data.csv");
    assert_eq!(tagged_cache_file_name("BTC-USD", Some("synthetic")), "synthetic_btc_data.csv");
    assert_eq!(tagged_cache_file_name("ETH-USD", Some("synthetic")), "synthetic_eth_usd_data.csv");
}
