//! Statistical diagnostics: rolling statistics, unit-root and stationarity
//! tests, and autocorrelation.

pub mod autocorrelation;
pub mod kpss;
pub mod rolling;
pub mod stationarity;
pub mod stats;

pub use autocorrelation::{acf, pacf, Correlogram};
pub use kpss::{kpss_test, ndiffs, KpssResult};
pub use rolling::{rolling_mean, rolling_stats, rolling_std};
pub use stationarity::{adf_test, StationarityOutcome, StationarityTester};
