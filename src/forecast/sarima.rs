//! Seasonal ARIMA fitted by conditional sum of squares.

use crate::error::{AnalyticsError, Result};
use crate::forecast::diff::{difference, integrate, seasonal_difference, seasonal_integrate};
use crate::forecast::optimize::{minimize, SimplexOptions};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;

/// Full model order: (p, d, q)(P, D, Q) at a seasonal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub sp: usize,
    pub sd: usize,
    pub sq: usize,
    pub period: usize,
}

impl SarimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            sp: 0,
            sd: 0,
            sq: 0,
            period: 0,
        }
    }

    pub fn seasonal(
        p: usize,
        d: usize,
        q: usize,
        sp: usize,
        sd: usize,
        sq: usize,
        period: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            sp,
            sd,
            sq,
            period,
        }
    }

    pub fn is_seasonal(&self) -> bool {
        self.period > 1 && (self.sp > 0 || self.sd > 0 || self.sq > 0)
    }

    /// AR + MA + seasonal AR + seasonal MA coefficients plus the intercept.
    pub fn param_count(&self) -> usize {
        self.p + self.q + self.sp + self.sq + 1
    }

    /// Shortest series the model can be estimated on.
    pub fn min_observations(&self) -> usize {
        self.d + self.sd * self.period + self.longest_lag() + 2
    }

    fn longest_lag(&self) -> usize {
        let regular = self.p.max(self.q);
        let seasonal = self.sp.max(self.sq) * self.period;
        regular.max(seasonal)
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_seasonal() {
            write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                self.p, self.d, self.q, self.sp, self.sd, self.sq, self.period
            )
        } else {
            write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
        }
    }
}

/// Everything derived during a fit, kept together so `Sarima` holds a
/// single `Option`.
#[derive(Debug, Clone)]
struct FittedState {
    ar: Vec<f64>,
    ma: Vec<f64>,
    sar: Vec<f64>,
    sma: Vec<f64>,
    intercept: f64,
    /// The input series, untouched.
    original: Vec<f64>,
    /// Seasonally differenced but not regular-differenced.
    seasonal_level: Vec<f64>,
    /// Fully differenced, the scale the recursion runs on.
    stationary: Vec<f64>,
    residuals: Vec<f64>,
    residual_variance: f64,
    aic: f64,
    bic: f64,
}

/// SARIMA(p, d, q)(P, D, Q)\[m\]. Coefficients come from minimizing the
/// conditional sum of squares with a bounded simplex search.
#[derive(Debug, Clone)]
pub struct Sarima {
    order: SarimaOrder,
    fitted: Option<FittedState>,
}

impl Sarima {
    pub fn new(order: SarimaOrder) -> Self {
        Self {
            order,
            fitted: None,
        }
    }

    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    pub fn aic(&self) -> Option<f64> {
        self.fitted.as_ref().map(|s| s.aic)
    }

    pub fn bic(&self) -> Option<f64> {
        self.fitted.as_ref().map(|s| s.bic)
    }

    pub fn residual_variance(&self) -> Option<f64> {
        self.fitted.as_ref().map(|s| s.residual_variance)
    }

    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        let needed = self.order.min_observations();
        if values.len() < needed {
            return Err(AnalyticsError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let seasonal_level = seasonal_difference(values, self.order.sd, self.order.period);
        let stationary = difference(&seasonal_level, self.order.d);
        if stationary.len() <= self.order.longest_lag() {
            return Err(AnalyticsError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let (intercept, ar, ma, sar, sma) = self.estimate(&stationary);

        let residuals = recursion_residuals(&stationary, self.order, &ar, &ma, &sar, &sma, intercept);
        let start = self.order.longest_lag();
        let tail = &residuals[start..];
        if tail.is_empty() {
            return Err(AnalyticsError::Forecast(format!(
                "no usable residuals for {}",
                self.order
            )));
        }
        let residual_variance = tail.iter().map(|r| r * r).sum::<f64>() / tail.len() as f64;
        if !residual_variance.is_finite() {
            return Err(AnalyticsError::Forecast(format!(
                "estimation diverged for {}",
                self.order
            )));
        }

        let n_eff = tail.len() as f64;
        let k = self.order.param_count() as f64;
        let log_likelihood = -0.5
            * n_eff
            * (1.0 + residual_variance.max(f64::MIN_POSITIVE).ln()
                + (2.0 * std::f64::consts::PI).ln());
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n_eff.ln();

        self.fitted = Some(FittedState {
            ar,
            ma,
            sar,
            sma,
            intercept,
            original: values.to_vec(),
            seasonal_level,
            stationary,
            residuals,
            residual_variance,
            aic,
            bic,
        });
        Ok(())
    }

    fn estimate(&self, stationary: &[f64]) -> (f64, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
        let order = self.order;
        let mean = stationary.iter().sum::<f64>() / stationary.len() as f64;
        let coeffs = order.p + order.q + order.sp + order.sq;

        if coeffs == 0 {
            return (mean, vec![], vec![], vec![], vec![]);
        }

        let mut initial = vec![0.0; coeffs + 1];
        initial[0] = mean;
        for (i, slot) in initial[1..].iter_mut().enumerate() {
            *slot = 0.1 / (i % 4 + 1) as f64;
        }

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(coeffs));

        let options = SimplexOptions {
            max_iterations: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };

        let outcome = minimize(
            |params| {
                let (intercept, ar, ma, sar, sma) = split_params(params, order);
                css(stationary, order, ar, ma, sar, sma, intercept)
            },
            &initial,
            Some(&bounds),
            options,
        );

        let (intercept, ar, ma, sar, sma) = split_params(&outcome.point, order);
        (
            intercept,
            ar.to_vec(),
            ma.to_vec(),
            sar.to_vec(),
            sma.to_vec(),
        )
    }

    /// Point forecast `horizon` steps past the end of the fitted series.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let state = self
            .fitted
            .as_ref()
            .ok_or_else(|| AnalyticsError::Forecast("forecast requested before fit".to_string()))?;

        if horizon == 0 {
            return Ok(vec![]);
        }

        let order = self.order;
        let mut extended = state.stationary.clone();
        let mut residuals = state.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = state.intercept;
            for i in 0..order.p {
                if t > i {
                    pred += state.ar[i] * (extended[t - 1 - i] - state.intercept);
                }
            }
            for i in 0..order.sp {
                let lag = (i + 1) * order.period;
                if t >= lag {
                    pred += state.sar[i] * (extended[t - lag] - state.intercept);
                }
            }
            for i in 0..order.q {
                if t > i {
                    pred += state.ma[i] * residuals[t - 1 - i];
                }
            }
            for i in 0..order.sq {
                let lag = (i + 1) * order.period;
                if t >= lag {
                    pred += state.sma[i] * residuals[t - lag];
                }
            }
            extended.push(pred);
            residuals.push(0.0);
        }

        let on_diff_scale = extended[state.stationary.len()..].to_vec();
        let on_seasonal_scale = integrate(&on_diff_scale, &state.seasonal_level, order.d);
        Ok(seasonal_integrate(
            &on_seasonal_scale,
            &state.original,
            order.sd,
            order.period,
        ))
    }

    /// Point forecast with symmetric normal-theory intervals at `level`
    /// (e.g. 0.95). Variance grows linearly with the step.
    pub fn forecast_with_intervals(
        &self,
        horizon: usize,
        level: f64,
    ) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        let point = self.forecast(horizon)?;
        let variance = self
            .fitted
            .as_ref()
            .map(|s| s.residual_variance)
            .unwrap_or(0.0);

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| AnalyticsError::Forecast(format!("interval quantile: {e}")))?;
        let z = normal.inverse_cdf((1.0 + level) / 2.0);

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, value) in point.iter().enumerate() {
            let se = (variance * (h + 1) as f64).sqrt();
            lower.push(value - z * se);
            upper.push(value + z * se);
        }
        Ok((point, lower, upper))
    }
}

fn split_params(params: &[f64], order: SarimaOrder) -> (f64, &[f64], &[f64], &[f64], &[f64]) {
    let intercept = params[0];
    let mut at = 1;
    let ar = &params[at..at + order.p];
    at += order.p;
    let ma = &params[at..at + order.q];
    at += order.q;
    let sar = &params[at..at + order.sp];
    at += order.sp;
    let sma = &params[at..at + order.sq];
    (intercept, ar, ma, sar, sma)
}

/// One-step-ahead residuals of the recursion over the stationary series.
fn recursion_residuals(
    w: &[f64],
    order: SarimaOrder,
    ar: &[f64],
    ma: &[f64],
    sar: &[f64],
    sma: &[f64],
    intercept: f64,
) -> Vec<f64> {
    let start = {
        let regular = order.p.max(order.q);
        let seasonal = order.sp.max(order.sq) * order.period;
        regular.max(seasonal)
    };
    let mut residuals = vec![0.0; w.len()];

    for t in start..w.len() {
        let mut pred = intercept;
        for i in 0..order.p {
            pred += ar[i] * (w[t - 1 - i] - intercept);
        }
        for i in 0..order.sp {
            pred += sar[i] * (w[t - (i + 1) * order.period] - intercept);
        }
        for i in 0..order.q {
            pred += ma[i] * residuals[t - 1 - i];
        }
        for i in 0..order.sq {
            pred += sma[i] * residuals[t - (i + 1) * order.period];
        }
        residuals[t] = w[t] - pred;
    }
    residuals
}

/// Conditional sum of squares of the recursion.
fn css(
    w: &[f64],
    order: SarimaOrder,
    ar: &[f64],
    ma: &[f64],
    sar: &[f64],
    sma: &[f64],
    intercept: f64,
) -> f64 {
    let start = {
        let regular = order.p.max(order.q);
        let seasonal = order.sp.max(order.sq) * order.period;
        regular.max(seasonal)
    };
    if w.len() <= start {
        return f64::MAX;
    }

    let residuals = recursion_residuals(w, order, ar, ma, sar, sma, intercept);
    let css: f64 = residuals[start..].iter().map(|e| e * e).sum();
    if css.is_finite() {
        css
    } else {
        f64::MAX
    }
}
