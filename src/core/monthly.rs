//! Month-start keyed series.

use crate::error::{AnalyticsError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// First day of the calendar month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("first of month always exists")
}

/// `count` consecutive month starts following `last`.
pub fn months_after(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let base = month_start(last);
    (1..=count as u32)
        .map(|i| base + Months::new(i))
        .collect()
}

/// How dated values are folded into a monthly bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlyAggregate {
    Sum,
    Mean,
    Count,
}

/// A time series keyed by calendar-month start: unique sorted keys, one
/// value per month. Months without data are gaps, not zeros.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySeries {
    months: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Build from parallel vectors. Keys must be month starts, strictly
    /// increasing.
    pub fn new(months: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if months.len() != values.len() {
            return Err(AnalyticsError::InvalidParameter(format!(
                "months ({}) and values ({}) differ in length",
                months.len(),
                values.len()
            )));
        }
        for window in months.windows(2) {
            if window[1] <= window[0] {
                return Err(AnalyticsError::InvalidParameter(
                    "month keys must be strictly increasing".to_string(),
                ));
            }
        }
        if months.iter().any(|m| m.day() != 1) {
            return Err(AnalyticsError::InvalidParameter(
                "month keys must be month starts".to_string(),
            ));
        }
        Ok(Self { months, values })
    }

    /// Resample dated values into calendar-month buckets.
    pub fn resample<I>(dated: I, aggregate: MonthlyAggregate) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for (date, value) in dated {
            let entry = buckets.entry(month_start(date)).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        let mut months = Vec::with_capacity(buckets.len());
        let mut values = Vec::with_capacity(buckets.len());
        for (month, (sum, count)) in buckets {
            months.push(month);
            values.push(match aggregate {
                MonthlyAggregate::Sum => sum,
                MonthlyAggregate::Mean => sum / count as f64,
                MonthlyAggregate::Count => count as f64,
            });
        }
        Self { months, values }
    }

    pub fn empty() -> Self {
        Self {
            months: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn months(&self) -> &[NaiveDate] {
        &self.months
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, month: NaiveDate) -> Option<f64> {
        self.months
            .binary_search(&month_start(month))
            .ok()
            .map(|i| self.values[i])
    }

    pub fn last_month(&self) -> Option<NaiveDate> {
        self.months.last().copied()
    }

    /// Period-over-period percent change. The first period has no prior
    /// period and is `None`; a zero prior period is also `None`.
    pub fn pct_change(&self) -> Vec<Option<f64>> {
        let mut changes = Vec::with_capacity(self.values.len());
        for i in 0..self.values.len() {
            if i == 0 {
                changes.push(None);
                continue;
            }
            let prev = self.values[i - 1];
            if prev == 0.0 {
                changes.push(None);
            } else {
                changes.push(Some((self.values[i] - prev) / prev * 100.0));
            }
        }
        changes
    }

    /// The most recent `n` months, ascending. Returns the whole series when
    /// it is shorter than `n`.
    pub fn last_n(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self {
            months: self.months[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }

    /// Month with the greatest value; ties break toward the earliest month.
    pub fn max_entry(&self) -> Option<(NaiveDate, f64)> {
        self.entry_by(|candidate, best| candidate > best)
    }

    /// Month with the smallest value; ties break toward the earliest month.
    pub fn min_entry(&self) -> Option<(NaiveDate, f64)> {
        self.entry_by(|candidate, best| candidate < best)
    }

    fn entry_by(&self, better: impl Fn(f64, f64) -> bool) -> Option<(NaiveDate, f64)> {
        let mut best: Option<(NaiveDate, f64)> = None;
        for (&month, &value) in self.months.iter().zip(&self.values) {
            match best {
                Some((_, current)) if better(value, current) => best = Some((month, value)),
                None => best = Some((month, value)),
                _ => {}
            }
        }
        best
    }

    /// Total across all months.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}
