//! The linear analysis flow and the charts it emits.
//!
//! Load → plot → test raw series → difference → test differenced series →
//! correlogram → order search → forecast → plot.

use chrono::Datelike;
use tracing::info;

use crate::analysis::{Correlogram, StationarityOutcome, StationarityTester};
use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::models::{AutoArima, AutoArimaFit, DifferencedSeries, ForecastResult, PriceSeries};
use crate::provider::{DataProvider, Origin};
use crate::render::{Chart, ChartSeries, Renderer};
use crate::source::FetchRequest;

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub series: PriceSeries,
    pub origin: Origin,
    pub raw: StationarityOutcome,
    pub differenced: DifferencedSeries,
    pub diff: StationarityOutcome,
    pub correlogram: Correlogram,
    pub selection: AutoArimaFit,
    pub forecast: ForecastResult,
}

/// Fewest prices a run accepts: one full rolling window on the differenced
/// series plus the observation differencing consumes.
pub fn min_observations(config: &PipelineConfig) -> usize {
    config.window.max(crate::analysis::stationarity::MIN_OBSERVATIONS) + 1
}

/// Search the order, fit, and forecast `config.horizon` days past the last date.
pub fn forecast_step(series: &PriceSeries, config: &PipelineConfig) -> Result<(AutoArimaFit, ForecastResult)> {
    let last = series
        .last()
        .ok_or_else(|| ForecastError::InsufficientData { required: 1, actual: 0 })?;

    let search = AutoArima {
        max_p: config.max_p,
        max_q: config.max_q,
        max_d: config.max_d,
        ..AutoArima::default()
    };
    let selection = search.fit(&series.values())?;
    let prediction = selection
        .model
        .predict_with_alpha(config.horizon, 1.0 - config.confidence)?;
    let forecast = ForecastResult::from_predictions(
        last.date,
        config.confidence,
        &prediction.mean,
        &prediction.lower,
        &prediction.upper,
    )?;
    Ok((selection, forecast))
}

pub fn price_chart(series: &PriceSeries, config: &PipelineConfig) -> Chart {
    let title = format!(
        "{} Closing Price ({} - {})",
        series.symbol,
        config.start.year(),
        config.end.year()
    );
    Chart::line(&title, "Date", "Price").with_series(ChartSeries::dated(
        &format!("{} Closing Price", series.symbol),
        &series.dates(),
        &series.values(),
    ))
}

pub fn differenced_chart(diff: &DifferencedSeries) -> Chart {
    Chart::line("Differenced series (1st Order)", "Date", "Change").with_series(
        ChartSeries::dated("Differenced", &diff.dates(), &diff.values()),
    )
}

pub fn forecast_chart(series: &PriceSeries, forecast: &ForecastResult) -> Chart {
    let dates = forecast.dates();
    let pick = |f: fn(&crate::models::ForecastPoint) -> f64| -> Vec<f64> {
        forecast.points.iter().map(f).collect()
    };
    Chart::line(&format!("{} Forecast", series.symbol), "Date", "Price")
        .with_series(ChartSeries::dated("Historical", &series.dates(), &series.values()))
        .with_series(ChartSeries::dated("Forecast (ARIMA)", &dates, &pick(|p| p.mean)).dashed())
        .with_series(ChartSeries::dated("Lower bound", &dates, &pick(|p| p.lower)).dashed())
        .with_series(ChartSeries::dated("Upper bound", &dates, &pick(|p| p.upper)).dashed())
}

/// Run every stage in order, sending charts to `renderer` as they are produced.
pub fn run(
    provider: &mut DataProvider,
    config: &PipelineConfig,
    renderer: &mut dyn Renderer,
) -> Result<AnalysisReport> {
    config.validate()?;
    let request = FetchRequest::new(&config.symbol, config.start, config.end);
    let (series, origin) = provider.resolve(&request)?;

    let required = min_observations(config);
    if series.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: series.len(),
        });
    }

    renderer.render(&price_chart(&series, config))?;

    let tester = StationarityTester::new(config.window);
    let raw = tester.test("Rolling Mean & Standard Deviation", series.points(), renderer)?;
    info!(
        statistic = raw.report.statistic,
        p_value = raw.report.p_value,
        stationary = raw.report.is_stationary,
        "ADF test on prices"
    );

    let differenced = series.difference();
    let diff = tester.test(
        "Rolling Mean & Standard Deviation (1st difference)",
        differenced.points(),
        renderer,
    )?;
    info!(
        statistic = diff.report.statistic,
        p_value = diff.report.p_value,
        stationary = diff.report.is_stationary,
        "ADF test on first differences"
    );

    let correlogram = Correlogram::compute(&differenced.values(), config.lags, config.confidence);
    for chart in correlogram.charts() {
        renderer.render(&chart)?;
    }
    renderer.render(&differenced_chart(&differenced))?;

    let (selection, forecast) = forecast_step(&series, config)?;
    renderer.render(&forecast_chart(&series, &forecast))?;

    Ok(AnalysisReport {
        series,
        origin,
        raw,
        differenced,
        diff,
        correlogram,
        selection,
        forecast,
    })
}
