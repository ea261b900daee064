//! Differencing and integration for seasonal ARIMA.

/// Difference a series `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut out = series.to_vec();
    for _ in 0..d {
        if out.len() <= 1 {
            break;
        }
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

/// Difference a series `d` times at lag `period`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut out = series.to_vec();
    for _ in 0..d {
        if out.len() <= period {
            break;
        }
        out = out
            .iter()
            .skip(period)
            .zip(out.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    out
}

/// Undo `d` rounds of regular differencing on forecast values, continuing
/// from the tail of `history` (the series on the undifferenced scale).
pub fn integrate(forecast: &[f64], history: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || forecast.is_empty() {
        return forecast.to_vec();
    }

    let mut out = forecast.to_vec();
    for level in (0..d).rev() {
        let seed = if level == 0 {
            history.last().copied().unwrap_or(0.0)
        } else {
            difference(history, level).last().copied().unwrap_or(0.0)
        };

        let mut running = seed;
        for value in &mut out {
            running += *value;
            *value = running;
        }
    }
    out
}

/// Undo `d` rounds of lag-`period` differencing on forecast values. Each
/// reconstructed value adds back the observation one period earlier, drawing
/// from `history` first and then from the values already reconstructed.
pub fn seasonal_integrate(forecast: &[f64], history: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 || forecast.is_empty() {
        return forecast.to_vec();
    }

    let mut out = forecast.to_vec();
    for level in (0..d).rev() {
        let base = seasonal_difference(history, level, period);
        let mut extended = base;
        for value in &mut out {
            let prev = if extended.len() >= period {
                extended[extended.len() - period]
            } else {
                0.0
            };
            *value += prev;
            extended.push(*value);
        }
        out = extended.split_off(extended.len() - forecast.len());
    }
    out
}

/// Suggest a regular differencing order (0, 1 or 2) from the variance ratio
/// between the series and its differences.
pub fn suggest_differencing(series: &[f64]) -> usize {
    if series.len() < 3 {
        return 0;
    }

    let var_0 = variance(series);
    let diff_1 = difference(series, 1);
    if diff_1.len() < 2 {
        return 0;
    }
    let var_1 = variance(&diff_1);

    if var_0 > 0.0 && var_1 / var_0 < 0.9 {
        let diff_2 = difference(&diff_1, 1);
        if diff_2.len() >= 2 {
            let var_2 = variance(&diff_2);
            if var_2 / var_1 < 0.9 && var_2 < var_0 {
                return 2;
            }
        }
        return 1;
    }
    0
}

/// Suggest a seasonal differencing order (0 or 1): 1 when differencing at
/// lag `period` removes a substantial share of the variance.
pub fn suggest_seasonal_differencing(series: &[f64], period: usize) -> usize {
    if period < 2 || series.len() < 2 * period {
        return 0;
    }

    let var_orig = variance(series);
    let diffed = seasonal_difference(series, 1, period);
    if diffed.len() < 2 || var_orig <= 0.0 {
        return 0;
    }

    if variance(&diffed) < var_orig * 0.7 {
        1
    } else {
        0
    }
}

fn variance(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (series.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_removes_linear_trend() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
        assert_eq!(difference(&series, 0), series);
    }

    #[test]
    fn seasonal_difference_removes_repeating_pattern() {
        let series = vec![
            100.0, 120.0, 80.0, 90.0, // year 1
            110.0, 130.0, 90.0, 100.0, // year 2
        ];
        assert_eq!(
            seasonal_difference(&series, 1, 4),
            vec![10.0, 10.0, 10.0, 10.0]
        );
    }

    #[test]
    fn integrate_continues_from_history() {
        let history = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let forecast_diff = vec![6.0, 7.0];
        let integrated = integrate(&forecast_diff, &history, 1);
        assert_relative_eq!(integrated[0], 30.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 37.0, epsilon = 1e-10);
    }

    #[test]
    fn integrate_round_trips_second_order() {
        let history = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        // Second differences of a quadratic are constant.
        let forecast_diff = vec![1.0, 1.0];
        let integrated = integrate(&forecast_diff, &history, 2);
        assert_relative_eq!(integrated[0], 21.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 28.0, epsilon = 1e-10);
    }

    #[test]
    fn seasonal_integrate_round_trips() {
        // Two full periods of history plus a forecast of seasonal deltas.
        let history = vec![100.0, 120.0, 80.0, 90.0, 110.0, 130.0, 90.0, 100.0];
        let deltas = vec![10.0, 10.0, 10.0, 10.0, 10.0];
        let integrated = seasonal_integrate(&deltas, &history, 1, 4);
        // Each value is last year's same quarter plus the delta; the fifth
        // draws from the reconstructed values themselves.
        assert_eq!(integrated, vec![120.0, 140.0, 100.0, 110.0, 130.0]);
    }

    #[test]
    fn suggest_differencing_flags_trends() {
        let stationary = vec![1.0, 0.5, 1.2, 0.8, 1.1, 0.9, 1.0, 1.1];
        assert_eq!(suggest_differencing(&stationary), 0);

        let trending: Vec<f64> = (0..20).map(|i| 10.0 + 2.0 * i as f64).collect();
        assert!(suggest_differencing(&trending) >= 1);
    }

    #[test]
    fn suggest_seasonal_differencing_flags_strong_seasonality() {
        let seasonal: Vec<f64> = (0..48)
            .map(|i| 100.0 + 50.0 * (i as f64 * std::f64::consts::TAU / 12.0).sin())
            .collect();
        assert_eq!(suggest_seasonal_differencing(&seasonal, 12), 1);

        let flat = vec![5.0; 30];
        assert_eq!(suggest_seasonal_differencing(&flat, 12), 0);

        let short = vec![1.0; 10];
        assert_eq!(suggest_seasonal_differencing(&short, 12), 0);
    }
}
