pub mod arima;
pub mod auto;
pub mod forecast;
pub mod report;
pub mod series;

pub use arima::{ArimaModel, ArimaOrder, Prediction};
pub use auto::{AutoArima, AutoArimaFit, Candidate};
pub use forecast::*;
pub use report::*;
pub use series::*;
