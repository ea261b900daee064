//! # salescope
//!
//! Sales analytics core: loads transactional CSV data, derives descriptive
//! and customer metrics, and projects monthly revenue ahead with an
//! automatically selected seasonal ARIMA.
//!
//! The typical flow is [`dataset::load_csv`] into an [`Analyzer`], which
//! memoizes full [`pipeline::AnalysisReport`]s per input and parameter set.

#![allow(clippy::needless_range_loop)]

pub mod cache;
pub mod compare;
pub mod core;
pub mod dataset;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod pipeline;

pub use cache::Analyzer;
pub use error::{AnalyticsError, Result};

pub mod prelude {
    pub use crate::cache::Analyzer;
    pub use crate::compare::{comparison_window, ComparisonWindow};
    pub use crate::core::{MonthlyAggregate, MonthlySeries, TrendLine};
    pub use crate::dataset::{
        load_csv, load_csv_bytes, ColumnRoles, DateFilter, DateFormat, NormalizedTable, RawTable,
    };
    pub use crate::error::{AnalyticsError, Result};
    pub use crate::forecast::{ForecastEngine, SalesForecast, SarimaOrder};
    pub use crate::metrics::{MetricsBundle, MetricsConfig, RankedEntry};
    pub use crate::pipeline::{run_analysis, AnalysisParams, AnalysisReport};
}
