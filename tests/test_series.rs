//! Tests for the price series model and differencing.

mod common;

use common::{daily_series, date};
use price_forecast::models::{difference, Observation, PriceSeries};
use price_forecast::ForecastError;

// ---------------------------------------------------------------------------
// Differencing
// ---------------------------------------------------------------------------

#[test]
fn difference_of_slice() {
    assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 1), vec![2.0, 3.0, 4.0]);
    assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 2), vec![1.0, 1.0]);
    assert_eq!(difference(&[1.0, 3.0], 0), vec![1.0, 3.0]);
}

#[test]
fn difference_of_too_short_slice_is_empty() {
    assert!(difference(&[5.0], 1).is_empty());
    assert!(difference(&[1.0, 2.0], 2).is_empty());
}

#[test]
fn differenced_series_keeps_later_dates() {
    let series = daily_series("BTC-USD", date(2024, 1, 1), &[1.0, 3.0, 6.0, 10.0]);
    let diff = series.difference();

    assert_eq!(diff.order, 1);
    assert_eq!(diff.len(), series.len() - 1);
    assert_eq!(diff.values(), vec![2.0, 3.0, 4.0]);
    assert_eq!(diff.dates(), vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]);
    assert_eq!(diff.symbol, "BTC-USD");
}

#[test]
fn second_difference_drops_two_points() {
    let values: Vec<f64> = (0..50).map(|i| (i * i) as f64).collect();
    let series = daily_series("X", date(2024, 3, 1), &values);
    let second = series.difference().difference();

    assert_eq!(second.order, 2);
    assert_eq!(second.len(), series.len() - 2);
    assert!(second.values().iter().all(|v| (*v - 2.0).abs() < 1e-12));
}

#[test]
fn difference_of_single_point_series_is_empty() {
    let series = daily_series("X", date(2024, 1, 1), &[100.0]);
    assert!(series.difference().is_empty());
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn new_rejects_negative_price() {
    let points = vec![
        Observation::new(date(2024, 1, 1), 10.0),
        Observation::new(date(2024, 1, 2), -1.0),
    ];
    assert!(matches!(
        PriceSeries::new("X", points),
        Err(ForecastError::InvalidArgument(_))
    ));
}

#[test]
fn new_rejects_non_finite_price() {
    let points = vec![Observation::new(date(2024, 1, 1), f64::NAN)];
    assert!(PriceSeries::new("X", points).is_err());
}

#[test]
fn new_rejects_unordered_or_repeated_dates() {
    let repeated = vec![
        Observation::new(date(2024, 1, 2), 1.0),
        Observation::new(date(2024, 1, 2), 2.0),
    ];
    assert!(PriceSeries::new("X", repeated).is_err());

    let backwards = vec![
        Observation::new(date(2024, 1, 3), 1.0),
        Observation::new(date(2024, 1, 2), 2.0),
    ];
    assert!(PriceSeries::new("X", backwards).is_err());
}

#[test]
fn new_accepts_calendar_gaps() {
    let points = vec![
        Observation::new(date(2024, 1, 1), 1.0),
        Observation::new(date(2024, 1, 5), 2.0),
    ];
    let series = PriceSeries::new("X", points).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.first().unwrap().date, date(2024, 1, 1));
    assert_eq!(series.last().unwrap().date, date(2024, 1, 5));
}

#[test]
fn from_unsorted_sorts_and_keeps_last_duplicate() {
    let points = vec![
        Observation::new(date(2024, 1, 3), 30.0),
        Observation::new(date(2024, 1, 1), 10.0),
        Observation::new(date(2024, 1, 3), 33.0),
        Observation::new(date(2024, 1, 2), 20.0),
    ];
    let (series, duplicates) = PriceSeries::from_unsorted("X", points);

    assert_eq!(duplicates, 1);
    assert_eq!(series.dates(), vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
    assert_eq!(series.values(), vec![10.0, 20.0, 33.0]);
}
