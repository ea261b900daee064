//! Seasonal ARIMA forecasting: differencing, estimation, order selection
//! and the holdout-evaluated forward forecast.

pub mod auto;
pub mod diff;
pub mod engine;
pub mod optimize;
pub mod sarima;

pub use auto::{AutoSarima, AutoSarimaConfig};
pub use engine::{mape, ForecastEngine, SalesForecast, MIN_HISTORY_MONTHS, TRAIN_RATIO};
pub use sarima::{Sarima, SarimaOrder};
