//! Stepwise order selection for the seasonal ARIMA.

use crate::error::{AnalyticsError, Result};
use crate::forecast::diff::{suggest_differencing, suggest_seasonal_differencing};
use crate::forecast::sarima::{Sarima, SarimaOrder};
use tracing::debug;

/// Search space limits. Defaults mirror a monthly retail series: yearly
/// seasonality with modest non-seasonal orders.
#[derive(Debug, Clone)]
pub struct AutoSarimaConfig {
    pub max_p: usize,
    pub max_q: usize,
    pub max_sp: usize,
    pub max_sq: usize,
    /// Seasonal period; 12 for monthly data.
    pub period: usize,
}

impl Default for AutoSarimaConfig {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_q: 3,
            max_sp: 2,
            max_sq: 2,
            period: 12,
        }
    }
}

/// Stepwise AIC-minimizing search over SARIMA orders. Candidates that fail
/// to estimate are skipped rather than failing the search.
#[derive(Debug, Clone)]
pub struct AutoSarima {
    config: AutoSarimaConfig,
}

impl AutoSarima {
    pub fn new() -> Self {
        Self {
            config: AutoSarimaConfig::default(),
        }
    }

    pub fn with_config(config: AutoSarimaConfig) -> Self {
        Self { config }
    }

    /// Fit every candidate order on `values` and return the model with the
    /// lowest AIC.
    pub fn fit(&self, values: &[f64]) -> Result<Sarima> {
        let period = self.config.period;
        if values.len() < period {
            return Err(AnalyticsError::InsufficientData {
                needed: period,
                got: values.len(),
            });
        }

        let d = suggest_differencing(values);
        let sd = suggest_seasonal_differencing(values, period);
        // Seasonal terms need at least two full cycles to say anything.
        let try_seasonal = period > 1 && values.len() >= 2 * period;

        let mut best: Option<Sarima> = None;
        for order in self.candidates(d, sd, try_seasonal) {
            let mut model = Sarima::new(order);
            match model.fit(values) {
                Ok(()) => {
                    let aic = model.aic().unwrap_or(f64::MAX);
                    debug!(%order, aic, "candidate fitted");
                    let improves = best
                        .as_ref()
                        .and_then(|b| b.aic())
                        .map_or(true, |best_aic| aic < best_aic);
                    if improves {
                        best = Some(model);
                    }
                }
                Err(err) => {
                    debug!(%order, %err, "candidate skipped");
                }
            }
        }

        best.ok_or_else(|| {
            AnalyticsError::Forecast("no candidate order could be estimated".to_string())
        })
    }

    /// Stepwise candidate pools, keyed off the suggested differencing
    /// orders rather than a full grid.
    fn candidates(&self, d: usize, sd: usize, try_seasonal: bool) -> Vec<SarimaOrder> {
        let period = self.config.period;

        let mut d_options = vec![d];
        if d > 0 {
            d_options.push(d - 1);
        }
        if d < 2 {
            d_options.push(d + 1);
        }

        let mut sd_options = vec![sd];
        if sd > 0 {
            sd_options.push(0);
        }

        const NONSEASONAL: &[(usize, usize)] = &[
            (0, 0),
            (1, 0),
            (0, 1),
            (1, 1),
            (2, 0),
            (0, 2),
            (2, 1),
            (1, 2),
            (2, 2),
        ];
        const SEASONAL: &[(usize, usize)] = &[(0, 1), (1, 0), (1, 1), (2, 0), (0, 2)];

        let mut candidates = Vec::new();
        for &d in &d_options {
            for &(p, q) in NONSEASONAL {
                if p <= self.config.max_p && q <= self.config.max_q {
                    candidates.push(SarimaOrder::new(p, d, q));
                }
            }

            if !try_seasonal {
                continue;
            }
            for &sd in &sd_options {
                for &(p, q) in NONSEASONAL {
                    for &(sp, sq) in SEASONAL {
                        if p <= self.config.max_p
                            && q <= self.config.max_q
                            && sp <= self.config.max_sp
                            && sq <= self.config.max_sq
                        {
                            candidates.push(SarimaOrder::seasonal(p, d, q, sp, sd, sq, period));
                        }
                    }
                }
            }
        }
        candidates
    }
}

impl Default for AutoSarima {
    fn default() -> Self {
        Self::new()
    }
}
