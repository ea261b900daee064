//! Descriptive and customer metrics over a normalized transaction set.
//!
//! Everything here is a pure reduction: no side effects, recomputed per
//! request. Rankings use a stable tie-break (value descending, then key
//! ascending) so repeated runs over tied data agree.

use crate::core::{MonthlyAggregate, MonthlySeries};
use crate::dataset::NormalizedTable;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One row of a "top" ranking: a category or customer id and its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    pub value: f64,
}

/// Sizes of the truncated rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MetricsConfig {
    /// Top-K cutoff for category rankings; 0 disables truncation.
    pub top_k_categories: usize,
    /// Top-N cutoff for customer rankings.
    pub top_n_customers: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            top_k_categories: 10,
            top_n_customers: 10,
        }
    }
}

/// The fixed bundle of metrics consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsBundle {
    /// Sum of amount over all rows in the window.
    pub total_sales: f64,
    /// Amount summed per category, top-K by sum.
    pub sales_by_category: Vec<RankedEntry>,
    /// Amount summed per calendar month.
    pub monthly_sales: MonthlySeries,
    /// Period-over-period percent change of `monthly_sales`; the first
    /// period has no prior period and is `None`.
    pub monthly_growth_pct: Vec<Option<f64>>,
    /// Mean amount per category, top-K by mean.
    pub avg_ticket_by_category: Vec<RankedEntry>,
    /// Mean amount per calendar month.
    pub avg_ticket_by_month: MonthlySeries,
    /// Amount summed per customer, top-N by sum.
    pub top_customers_by_spend: Vec<RankedEntry>,
    /// Transaction count per customer, top-N by count.
    pub top_customers_by_frequency: Vec<RankedEntry>,
    /// Customers with more than one transaction over distinct customers,
    /// for the whole window. `None` when there are no customers.
    pub overall_retention_rate: Option<f64>,
    /// Repeat-purchase rate per month with data: customers with more than
    /// one transaction that month over distinct customers that month. A
    /// month with customers but no repeats reads 0.0; months without any
    /// transactions are absent rather than zero-filled.
    pub monthly_repeat_rate: MonthlySeries,
    /// Mean per-customer total spend within the window. `None` when there
    /// are no customers. Scoped to the active filter, not all-time.
    pub customer_lifetime_value: Option<f64>,
    /// Null amount cells dropped during normalization, surfaced so the
    /// caller can warn about them.
    pub dropped_nulls: usize,
}

/// Compute the full metrics bundle for a normalized table.
pub fn compute(table: &NormalizedTable, config: MetricsConfig) -> MetricsBundle {
    let transactions = table.transactions();

    let total_sales: f64 = transactions.iter().map(|t| t.amount).sum();

    // Per-category and per-customer accumulators. BTreeMap gives the lexical
    // ordering the tie-break needs.
    let mut by_category: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    let mut by_customer: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for t in transactions {
        let c = by_category.entry(t.category.as_str()).or_insert((0.0, 0));
        c.0 += t.amount;
        c.1 += 1;
        let u = by_customer.entry(t.customer_id.as_str()).or_insert((0.0, 0));
        u.0 += t.amount;
        u.1 += 1;
    }

    let sales_by_category = ranked(
        by_category.iter().map(|(k, (sum, _))| (*k, *sum)),
        config.top_k_categories,
    );
    let avg_ticket_by_category = ranked(
        by_category
            .iter()
            .map(|(k, (sum, count))| (*k, sum / *count as f64)),
        config.top_k_categories,
    );
    let top_customers_by_spend = ranked(
        by_customer.iter().map(|(k, (sum, _))| (*k, *sum)),
        config.top_n_customers,
    );
    let top_customers_by_frequency = ranked(
        by_customer
            .iter()
            .map(|(k, (_, count))| (*k, *count as f64)),
        config.top_n_customers,
    );

    let monthly_sales = MonthlySeries::resample(
        transactions.iter().map(|t| (t.date, t.amount)),
        MonthlyAggregate::Sum,
    );
    let monthly_growth_pct = monthly_sales.pct_change();
    let avg_ticket_by_month = MonthlySeries::resample(
        transactions.iter().map(|t| (t.date, t.amount)),
        MonthlyAggregate::Mean,
    );

    let distinct_customers = by_customer.len();
    let repeat_customers = by_customer.values().filter(|(_, count)| *count > 1).count();
    let overall_retention_rate = if distinct_customers == 0 {
        None
    } else {
        Some(repeat_customers as f64 / distinct_customers as f64)
    };

    let customer_lifetime_value = if distinct_customers == 0 {
        None
    } else {
        Some(by_customer.values().map(|(sum, _)| sum).sum::<f64>() / distinct_customers as f64)
    };

    MetricsBundle {
        total_sales,
        sales_by_category,
        monthly_sales,
        monthly_growth_pct,
        avg_ticket_by_category,
        avg_ticket_by_month,
        top_customers_by_spend,
        top_customers_by_frequency,
        overall_retention_rate,
        monthly_repeat_rate: monthly_repeat_rate(table),
        customer_lifetime_value,
        dropped_nulls: table.dropped_nulls(),
    }
}

/// Repeat-purchase rate per calendar month.
fn monthly_repeat_rate(table: &NormalizedTable) -> MonthlySeries {
    let mut per_month: BTreeMap<NaiveDate, HashMap<&str, usize>> = BTreeMap::new();
    for t in table.transactions() {
        *per_month
            .entry(crate::core::month_start(t.date))
            .or_default()
            .entry(t.customer_id.as_str())
            .or_insert(0) += 1;
    }

    let mut months = Vec::with_capacity(per_month.len());
    let mut rates = Vec::with_capacity(per_month.len());
    for (month, customers) in per_month {
        let repeats = customers.values().filter(|&&c| c > 1).count();
        months.push(month);
        rates.push(repeats as f64 / customers.len() as f64);
    }
    MonthlySeries::new(months, rates).expect("BTreeMap keys are sorted month starts")
}

/// Sort descending by value with a lexical tie-break, then truncate to the
/// top `cutoff` entries (0 disables truncation).
fn ranked<'a, I>(entries: I, cutoff: usize) -> Vec<RankedEntry>
where
    I: Iterator<Item = (&'a str, f64)>,
{
    let mut ranked: Vec<RankedEntry> = entries
        .map(|(key, value)| RankedEntry {
            key: key.to_string(),
            value,
        })
        .collect();
    // Input arrives key-sorted; the sort is stable, so ties stay lexical.
    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    if cutoff > 0 {
        ranked.truncate(cutoff);
    }
    ranked
}
