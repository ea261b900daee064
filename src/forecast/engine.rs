//! Holdout evaluation and the forward sales forecast.

use crate::core::{linear_fit, months_after, MonthlySeries, TrendLine};
use crate::error::{AnalyticsError, Result};
use crate::forecast::auto::AutoSarima;
use crate::forecast::sarima::{Sarima, SarimaOrder};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Fewest history months the engine will forecast from: a full seasonal
/// cycle for training plus the evaluation floor.
pub const MIN_HISTORY_MONTHS: usize = 14;

/// Share of the history used for training during evaluation.
pub const TRAIN_RATIO: f64 = 0.85;

/// At least this many months are held out for evaluation.
pub const MIN_EVAL_MONTHS: usize = 2;

const SEASONAL_PERIOD: usize = 12;
const INTERVAL_LEVEL: f64 = 0.95;

/// Forward forecast with its evaluation context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesForecast {
    /// Month starts immediately following the history.
    pub months: Vec<NaiveDate>,
    /// Point forecast per month.
    pub values: Vec<f64>,
    /// Lower 95% band per month.
    pub lower: Vec<f64>,
    /// Upper 95% band per month.
    pub upper: Vec<f64>,
    /// Holdout mean absolute percentage error, in percent. `None` when
    /// every holdout actual was zero.
    pub mape: Option<f64>,
    /// The order the search settled on.
    pub order: SarimaOrder,
    /// Straight-line trend fitted over the forecast values.
    pub trend: Option<TrendLine>,
}

/// Runs the order search, scores it on a holdout tail, then refits the
/// chosen order on the full history for the forward forecast.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    selector: AutoSarima,
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forecast `horizon` months past the end of `series`.
    pub fn run(&self, series: &MonthlySeries, horizon: usize) -> Result<SalesForecast> {
        let n = series.len();
        if n < MIN_HISTORY_MONTHS {
            return Err(AnalyticsError::InsufficientData {
                needed: MIN_HISTORY_MONTHS,
                got: n,
            });
        }

        let values = series.values();
        let train_len = train_split(n);
        let (train, holdout) = values.split_at(train_len);

        let selected = self.selector.fit(train)?;
        let order = selected.order();
        let holdout_forecast = selected.forecast(holdout.len())?;
        let mape = mape(holdout, &holdout_forecast);
        debug!(%order, train_len, holdout = holdout.len(), ?mape, "holdout evaluation");

        // The forward forecast re-estimates the chosen order on the whole
        // history so the holdout months inform it too.
        let mut full_model = Sarima::new(order);
        full_model.fit(values)?;
        let (point, lower, upper) = full_model.forecast_with_intervals(horizon, INTERVAL_LEVEL)?;

        let last_month = series
            .last_month()
            .ok_or_else(|| AnalyticsError::Forecast("empty history".to_string()))?;

        Ok(SalesForecast {
            months: months_after(last_month, horizon),
            trend: linear_fit(&point),
            values: point,
            lower,
            upper,
            mape,
            order,
        })
    }
}

/// Training length: the configured share of the history, held back far
/// enough to leave the evaluation floor.
fn train_split(n: usize) -> usize {
    let by_ratio = (n as f64 * TRAIN_RATIO).floor() as usize;
    by_ratio.min(n - MIN_EVAL_MONTHS).max(SEASONAL_PERIOD)
}

/// Mean absolute percentage error, in percent. Pairs with a zero actual
/// are skipped; all-zero actuals yield `None`.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let mut total = 0.0;
    let mut counted = 0usize;
    for (&a, &p) in actual.iter().zip(predicted) {
        if a != 0.0 {
            total += ((a - p) / a).abs();
            counted += 1;
        }
    }
    if counted == 0 {
        None
    } else {
        Some(total / counted as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn history(n: usize) -> MonthlySeries {
        let months: Vec<NaiveDate> = (0..n)
            .map(|i| ymd(2020 + i as i32 / 12, (i % 12) as u32 + 1))
            .collect();
        let values: Vec<f64> = (0..n)
            .map(|i| {
                1000.0
                    + 12.0 * i as f64
                    + 200.0 * (i as f64 * std::f64::consts::TAU / 12.0).sin()
            })
            .collect();
        MonthlySeries::new(months, values).unwrap()
    }

    #[test]
    fn mape_skips_zero_actuals() {
        let actual = vec![100.0, 0.0, 200.0];
        let predicted = vec![110.0, 50.0, 180.0];
        // |10/100| and |20/200| average to 10%.
        assert_relative_eq!(mape(&actual, &predicted).unwrap(), 10.0, epsilon = 1e-9);
        assert_eq!(mape(&[0.0, 0.0], &[1.0, 2.0]), None);
    }

    #[test]
    fn train_split_honors_floor_and_ratio() {
        // 36 months: 85% is 30, leaving 6 for evaluation.
        assert_eq!(train_split(36), 30);
        // 14 months: the ratio would give 11, the seasonal floor lifts it
        // back to 12, still leaving the evaluation floor.
        assert_eq!(train_split(14), 12);
    }

    #[test]
    fn run_produces_labeled_forecast() {
        let series = history(48);
        let forecast = ForecastEngine::new().run(&series, 6).unwrap();

        assert_eq!(forecast.months.len(), 6);
        assert_eq!(forecast.values.len(), 6);
        assert_eq!(forecast.lower.len(), 6);
        assert_eq!(forecast.upper.len(), 6);

        // Labels continue the calendar directly after the history.
        assert_eq!(forecast.months[0], ymd(2024, 1));
        assert_eq!(forecast.months[5], ymd(2024, 6));

        // The history trends upward; the forecast should too.
        assert!(forecast.trend.is_some());
        assert!(forecast.mape.is_some());
        for i in 0..6 {
            assert!(forecast.lower[i] <= forecast.values[i]);
            assert!(forecast.upper[i] >= forecast.values[i]);
        }
    }

    #[test]
    fn short_history_is_rejected() {
        let series = history(10);
        let err = ForecastEngine::new().run(&series, 6).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InsufficientData {
                needed: MIN_HISTORY_MONTHS,
                ..
            }
        ));
    }
}
