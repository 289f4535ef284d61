//! Tests for ACF, PACF and the correlogram charts.

mod common;

use common::{ar1, white_noise};
use price_forecast::analysis::autocorrelation::{acf_bands, pacf_bands};
use price_forecast::analysis::{acf, pacf, Correlogram};
use price_forecast::render::ChartKind;

#[test]
fn acf_starts_at_one_and_has_requested_length() {
    let values = acf(&white_noise(200, 1), 40);
    assert_eq!(values.len(), 41);
    assert_eq!(values[0], 1.0);
    assert!(values.iter().all(|v| v.abs() <= 1.0 + 1e-12));
}

#[test]
fn lags_are_capped_by_series_length() {
    assert_eq!(acf(&[1.0, 2.0, 4.0], 10).len(), 3);
    assert_eq!(pacf(&[1.0, 2.0, 4.0], 10).len(), 3);
    assert!(acf(&[1.0], 5).is_empty());
}

#[test]
fn ar1_autocorrelation_decays_geometrically() {
    let data = ar1(4000, 0.7, 17);
    let values = acf(&data, 5);
    assert!((values[1] - 0.7).abs() < 0.06, "{:?}", values);
    assert!((values[2] - 0.49).abs() < 0.08, "{:?}", values);
}

#[test]
fn ar1_partial_autocorrelation_cuts_off_after_lag_one() {
    let data = ar1(4000, 0.7, 17);
    let partial = pacf(&data, 5);
    let full = acf(&data, 5);

    assert_eq!(partial[0], 1.0);
    assert_eq!(partial[1], full[1]);
    assert!((partial[1] - 0.7).abs() < 0.06);
    assert!(partial[2..].iter().all(|v| v.abs() < 0.08), "{:?}", partial);
}

#[test]
fn bands_use_normal_quantile() {
    let bands = pacf_bands(5, 400, 0.95);
    assert_eq!(bands[0], 0.0);
    assert!((bands[1] - 1.959964 / 20.0).abs() < 1e-6);
    assert!(bands[1..].iter().all(|b| *b == bands[1]));
}

#[test]
fn bartlett_bands_widen_with_lag() {
    let data = ar1(1000, 0.8, 2);
    let values = acf(&data, 20);
    let bands = acf_bands(&values, data.len(), 0.95);

    assert_eq!(bands.len(), values.len());
    assert_eq!(bands[0], 0.0);
    assert!((bands[1] - 1.959964 / (1000f64).sqrt()).abs() < 1e-6);
    assert!(bands[1..].windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn correlogram_flags_the_first_lag_of_an_ar_process() {
    let correlogram = Correlogram::compute(&ar1(2000, 0.6, 4), 40, 0.95);

    assert_eq!(correlogram.acf.len(), 41);
    assert_eq!(correlogram.pacf.len(), 41);
    assert!(correlogram.significant_acf_lags().contains(&1));
    assert_eq!(correlogram.significant_pacf_lags().first(), Some(&1));
}

#[test]
fn correlogram_charts_are_stems_with_bands() {
    let correlogram = Correlogram::compute(&white_noise(300, 8), 40, 0.95);
    let [acf_chart, pacf_chart] = correlogram.charts();

    assert_eq!(acf_chart.title, "Autocorrelation (ACF)");
    assert_eq!(pacf_chart.title, "Partial Autocorrelation (PACF)");
    for chart in [&acf_chart, &pacf_chart] {
        assert_eq!(chart.kind, ChartKind::Stem);
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series[0].points.len(), 41);
        assert!(!chart.series[0].dashed);
        assert!(chart.series[1].dashed && chart.series[2].dashed);
        assert_eq!(chart.series[1].points[3].1, -chart.series[2].points[3].1);
    }
}
