//! Recent-history window shown alongside the forecast.

use crate::core::{linear_fit, MonthlySeries, TrendLine};
use chrono::NaiveDate;
use serde::Serialize;

/// The last `horizon` observed months with their own fitted trend, so the
/// chart next to the forecast covers a window of equal length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonWindow {
    pub months: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub trend: Option<TrendLine>,
}

/// Cut the trailing window out of `series`. A series shorter than
/// `horizon` is used whole.
pub fn comparison_window(series: &MonthlySeries, horizon: usize) -> ComparisonWindow {
    let window = series.last_n(horizon);
    ComparisonWindow {
        trend: linear_fit(window.values()),
        months: window.months().to_vec(),
        values: window.values().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn window_takes_the_trailing_months() {
        let series = MonthlySeries::new(
            vec![ymd(2023, 1), ymd(2023, 2), ymd(2023, 3), ymd(2023, 4)],
            vec![10.0, 20.0, 30.0, 40.0],
        )
        .unwrap();

        let window = comparison_window(&series, 2);
        assert_eq!(window.months, vec![ymd(2023, 3), ymd(2023, 4)]);
        assert_eq!(window.values, vec![30.0, 40.0]);
        let trend = window.trend.unwrap();
        assert_relative_eq!(trend.slope, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn short_series_is_used_whole() {
        let series =
            MonthlySeries::new(vec![ymd(2023, 1), ymd(2023, 2)], vec![5.0, 7.0]).unwrap();
        let window = comparison_window(&series, 6);
        assert_eq!(window.values.len(), 2);
    }

    #[test]
    fn empty_series_has_no_trend() {
        let window = comparison_window(&MonthlySeries::empty(), 6);
        assert!(window.months.is_empty());
        assert_eq!(window.trend, None);
    }
}
