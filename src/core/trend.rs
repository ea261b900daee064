//! First-degree polynomial trend fitting.

use serde::Serialize;

/// A fitted line `y = slope * x + intercept` over indices 0..n.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    /// Evaluate the line at indices `0..n`.
    pub fn evaluate(&self, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| self.slope * i as f64 + self.intercept)
            .collect()
    }
}

/// Closed-form least-squares fit of a line through `values` at indices
/// 0..len. A single point yields a flat line; an empty slice yields `None`.
pub fn linear_fit(values: &[f64]) -> Option<TrendLine> {
    let n = values.len();
    match n {
        0 => None,
        1 => Some(TrendLine {
            slope: 0.0,
            intercept: values[0],
        }),
        _ => {
            let nf = n as f64;
            let x_mean = (nf - 1.0) / 2.0;
            let y_mean = values.iter().sum::<f64>() / nf;

            let mut ss_xy = 0.0;
            let mut ss_xx = 0.0;
            for (i, &y) in values.iter().enumerate() {
                let dx = i as f64 - x_mean;
                ss_xy += dx * (y - y_mean);
                ss_xx += dx * dx;
            }

            let slope = ss_xy / ss_xx;
            Some(TrendLine {
                slope,
                intercept: y_mean - slope * x_mean,
            })
        }
    }
}
