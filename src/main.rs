//! # price-forecast
//!
//! Load or download a daily price series, test it for stationarity, and
//! print a 30-day ARIMA forecast.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use price_forecast::config::{self, PipelineConfig};
use price_forecast::render::{CsvChartRenderer, TextRenderer};
use price_forecast::{
    AnalysisReport, NullRenderer, Origin, PriceForecast, PriceForecastBuilder, Result,
    SyntheticSource, YahooSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    Yahoo,
    Synthetic,
}

#[derive(Parser, Debug)]
#[command(name = "price-forecast")]
#[command(about = "Stationarity analysis and ARIMA forecast of a daily price series", long_about = None)]
struct Args {
    /// Ticker symbol to analyse
    #[arg(long)]
    symbol: Option<String>,

    /// First date to download (YYYY-MM-DD)
    #[arg(long, value_parser = config::parse_date)]
    start: Option<chrono::NaiveDate>,

    /// Exclusive end date (YYYY-MM-DD)
    #[arg(long, value_parser = config::parse_date)]
    end: Option<chrono::NaiveDate>,

    /// Explicit cache file path (overrides --cache-dir)
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Directory for the cache file
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Never contact the remote source
    #[arg(long)]
    offline: bool,

    /// Where to download prices from on a cache miss
    #[arg(long, value_enum, default_value = "yahoo")]
    source: SourceKind,

    /// Forecast horizon in days
    #[arg(long)]
    horizon: Option<usize>,

    /// Rolling window in observations
    #[arg(long)]
    window: Option<usize>,

    /// Number of ACF/PACF lags
    #[arg(long)]
    lags: Option<usize>,

    /// Write chart data as CSV files into this directory
    #[arg(long, conflicts_with = "text_charts")]
    charts: Option<PathBuf>,

    /// Print charts as text to stdout
    #[arg(long)]
    text_charts: bool,

    /// JSON run configuration; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delete the cache file before running
    #[arg(long)]
    clear_cache: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = config::HTTP_TIMEOUT_SECS)]
    timeout: u64,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        error!("Fatal error: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn pipeline_config(args: &Args) -> Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(symbol) = &args.symbol {
        cfg.symbol = symbol.clone();
    }
    if let Some(start) = args.start {
        cfg.start = start;
    }
    if let Some(end) = args.end {
        cfg.end = end;
    }
    if let Some(horizon) = args.horizon {
        cfg.horizon = horizon;
    }
    if let Some(window) = args.window {
        cfg.window = window;
    }
    if let Some(lags) = args.lags {
        cfg.lags = lags;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn build(args: &Args) -> Result<PriceForecast> {
    let timeout = Duration::from_secs(args.timeout);
    let mut builder: PriceForecastBuilder = PriceForecast::builder()
        .config(pipeline_config(args)?)
        .offline(args.offline)
        .timeout(timeout);

    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(file) = &args.cache_file {
        builder = builder.cache_file(file);
    }

    builder = match args.source {
        SourceKind::Yahoo => builder.source(YahooSource::new(timeout)),
        SourceKind::Synthetic => builder.source(SyntheticSource::default()),
    };

    builder = if let Some(dir) = &args.charts {
        builder.renderer(CsvChartRenderer::new(dir)?)
    } else if args.text_charts {
        builder.renderer(TextRenderer::stdout())
    } else {
        builder.renderer(NullRenderer)
    };

    builder.build()
}

fn run(args: Args) -> Result<()> {
    let mut app = build(&args)?;
    info!("{}", app);

    if args.clear_cache && app.clear_cache()? {
        info!(path = %app.cache().path.display(), "cache cleared");
    }

    let report = app.run()?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let series = &report.series;
    match report.origin {
        Origin::Cache(stats) => println!(
            "Loaded {} rows of {} from cache ({} dropped)",
            series.len(),
            series.symbol,
            stats.dropped()
        ),
        Origin::Remote => println!("Downloaded {} rows of {}", series.len(), series.symbol),
    }
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        println!("Range: {} to {}", first.date, last.date);
    }

    println!();
    println!("=== Stationarity Test (prices) ===");
    println!("{}", report.raw.report);

    println!();
    println!("=== After First Differencing ===");
    println!("{}", report.diff.report);

    println!();
    println!("=== Autocorrelation ===");
    println!("Significant ACF lags:  {:?}", report.correlogram.significant_acf_lags());
    println!("Significant PACF lags: {:?}", report.correlogram.significant_pacf_lags());

    println!();
    println!("=== Model Selection ===");
    let fitted = report.selection.candidates.iter().filter(|c| c.aic.is_some()).count();
    println!("{} candidates tried, {} fitted", report.selection.candidates.len(), fitted);
    println!("{}", report.selection.model.summary());

    println!("=== Forecast ({:.0}% interval) ===", report.forecast.confidence * 100.0);
    println!("{:<12} {:>14} {:>14} {:>14}", "Date", "Forecast", "Lower", "Upper");
    for point in &report.forecast.points {
        println!(
            "{:<12} {:>14.2} {:>14.2} {:>14.2}",
            point.date.to_string(),
            point.mean,
            point.lower,
            point.upper
        );
    }
}
