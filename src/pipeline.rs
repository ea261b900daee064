//! One-call analysis: raw table in, full report out.

use crate::compare::{comparison_window, ComparisonWindow};
use crate::core::{MonthlyAggregate, MonthlySeries};
use crate::dataset::{ColumnRoles, DateFilter, DateFormat, NormalizedTable, RawTable};
use crate::error::{AnalyticsError, Result};
use crate::forecast::{ForecastEngine, SalesForecast};
use crate::metrics::{self, MetricsBundle, MetricsConfig};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

/// Inclusive bounds on the forecast horizon, in months.
pub const HORIZON_RANGE: std::ops::RangeInclusive<usize> = 2..=12;

/// Inclusive bounds on the customer ranking cutoff.
pub const TOP_N_RANGE: std::ops::RangeInclusive<usize> = 2..=20;

/// Everything a single analysis run depends on.
///
/// `roles` left as `None` takes the table's first four columns in
/// (date, customer id, category, amount) order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisParams {
    pub roles: Option<ColumnRoles>,
    pub date_format: DateFormat,
    /// Window the metrics and comparison are scoped to. The forecast always
    /// trains on the full history.
    pub filter: DateFilter,
    /// Months to forecast ahead.
    pub horizon: usize,
    /// Customer ranking cutoff.
    pub top_n_customers: usize,
    /// Category ranking cutoff; 0 disables truncation.
    pub top_k_categories: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            roles: None,
            date_format: DateFormat::default(),
            filter: DateFilter::unbounded(),
            horizon: 6,
            top_n_customers: 10,
            top_k_categories: 10,
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<()> {
        if !HORIZON_RANGE.contains(&self.horizon) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "horizon must be between {} and {} months, got {}",
                HORIZON_RANGE.start(),
                HORIZON_RANGE.end(),
                self.horizon
            )));
        }
        if !TOP_N_RANGE.contains(&self.top_n_customers) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "top customer cutoff must be between {} and {}, got {}",
                TOP_N_RANGE.start(),
                TOP_N_RANGE.end(),
                self.top_n_customers
            )));
        }
        Ok(())
    }
}

/// The complete output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub metrics: MetricsBundle,
    pub forecast: SalesForecast,
    /// Trailing observed window of the same length as the forecast.
    pub comparison: ComparisonWindow,
    /// Earliest transaction date inside the filter window.
    pub window_start: Option<NaiveDate>,
    /// Latest transaction date inside the filter window.
    pub window_end: Option<NaiveDate>,
    /// Percent change of the filtered window's total sales against the
    /// window of equal length immediately before it. `None` without an
    /// active filter or when the preceding window sold nothing.
    pub previous_period_delta: Option<f64>,
}

/// Run the full analysis over a raw table.
///
/// Metrics and the comparison window respect `params.filter`; the forecast
/// and the previous-period delta always use the complete history so a
/// narrow window cannot starve the model.
pub fn run_analysis(table: &RawTable, params: &AnalysisParams) -> Result<AnalysisReport> {
    params.validate()?;

    let roles = match &params.roles {
        Some(roles) => roles.clone(),
        None => ColumnRoles::from_headers(table),
    };

    let full = NormalizedTable::from_raw(
        table,
        &roles,
        params.date_format,
        &DateFilter::unbounded(),
    )?;
    let windowed = full.filtered(&params.filter);
    info!(
        rows = full.len(),
        windowed = windowed.len(),
        horizon = params.horizon,
        "analysis started"
    );

    let metrics = metrics::compute(
        &windowed,
        MetricsConfig {
            top_k_categories: params.top_k_categories,
            top_n_customers: params.top_n_customers,
        },
    );

    let history = MonthlySeries::resample(
        full.transactions().iter().map(|t| (t.date, t.amount)),
        MonthlyAggregate::Sum,
    );
    let forecast = ForecastEngine::new().run(&history, params.horizon)?;
    let comparison = comparison_window(&history, params.horizon);
    let previous_period_delta = previous_period_delta(&full, &windowed, &params.filter);

    Ok(AnalysisReport {
        metrics,
        forecast,
        comparison,
        window_start: windowed.first_date(),
        window_end: windowed.last_date(),
        previous_period_delta,
    })
}

/// Total of the filtered window against the equally long span right before
/// it. Only meaningful when a filter is actually narrowing the data.
fn previous_period_delta(
    full: &NormalizedTable,
    windowed: &NormalizedTable,
    filter: &DateFilter,
) -> Option<f64> {
    if filter.is_unbounded() {
        return None;
    }
    let start = filter.start().or_else(|| windowed.first_date())?;
    let end = filter.end().or_else(|| windowed.last_date())?;

    let prev_end = start.pred_opt()?;
    let prev_start = prev_end - (end - start);
    let previous = full.filtered(&DateFilter::between(prev_start, prev_end).ok()?);

    let previous_total: f64 = previous.transactions().iter().map(|t| t.amount).sum();
    if previous_total == 0.0 {
        return None;
    }
    let current_total: f64 = windowed.transactions().iter().map(|t| t.amount).sum();
    Some((current_total - previous_total) / previous_total * 100.0)
}
