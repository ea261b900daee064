//! Normalization of raw tables into a clean, time-ordered transaction set.

use crate::dataset::loader::RawTable;
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which column of the raw table plays which role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub date: String,
    pub customer_id: String,
    pub category: String,
    pub amount: String,
}

impl ColumnRoles {
    pub fn new(date: &str, customer_id: &str, category: &str, amount: &str) -> Self {
        Self {
            date: date.to_string(),
            customer_id: customer_id.to_string(),
            category: category.to_string(),
            amount: amount.to_string(),
        }
    }

    /// Default roles for a table whose first four columns are already in
    /// (date, customer id, category, amount) order.
    pub fn from_headers(table: &RawTable) -> Self {
        let h = table.headers();
        Self::new(&h[0], &h[1], &h[2], &h[3])
    }
}

/// Date convention of the source column.
///
/// Bundled example data uses day/month/year; uploaded data tends to use
/// ISO-like conventions, so the caller must pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateFormat {
    /// Strict `%d/%m/%Y`.
    DayMonthYear,
    /// Try common conventions in order (ISO first).
    #[default]
    Flexible,
}

const FLEXIBLE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

impl DateFormat {
    fn parse(&self, cell: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::DayMonthYear => NaiveDate::parse_from_str(cell, "%d/%m/%Y").ok(),
            DateFormat::Flexible => FLEXIBLE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok()),
        }
    }
}

/// An inclusive date window with zero, one or two bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateFilter {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateFilter {
    /// No filtering.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Lower bound only.
    pub fn from(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Both bounds, inclusive. Fails when start is after end.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AnalyticsError::InvalidFilter { start, end });
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// One cleaned row of the source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub customer_id: String,
    pub category: String,
    pub amount: f64,
}

/// The transaction set sorted ascending by date, restricted to the filter
/// window, with null amounts dropped and counted.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    transactions: Vec<Transaction>,
    dropped_nulls: usize,
}

impl NormalizedTable {
    /// Normalize a raw table under the given column roles.
    ///
    /// Parses the date column (`Parse` error when a cell does not match the
    /// declared format, which usually means the wrong column was picked),
    /// coerces customer ids to text, drops rows with null amounts, sorts
    /// ascending by date (stable, so same-day rows keep file order) and
    /// applies the inclusive date filter. The input table is not modified.
    pub fn from_raw(
        table: &RawTable,
        roles: &ColumnRoles,
        format: DateFormat,
        filter: &DateFilter,
    ) -> Result<Self> {
        let date_idx = table.column_index(&roles.date)?;
        let id_idx = table.column_index(&roles.customer_id)?;
        let category_idx = table.column_index(&roles.category)?;
        let amount_idx = table.column_index(&roles.amount)?;

        let mut transactions = Vec::with_capacity(table.len());
        let mut dropped_nulls = 0usize;

        for (row_no, row) in table.rows().iter().enumerate() {
            let date_cell = row[date_idx].as_str();
            let date = format.parse(date_cell).ok_or_else(|| {
                AnalyticsError::Parse(format!(
                    "cannot parse '{}' as a date in column '{}' (row {})",
                    date_cell,
                    roles.date,
                    row_no + 1
                ))
            })?;

            let amount = match parse_amount(&row[amount_idx]) {
                AmountCell::Null => {
                    dropped_nulls += 1;
                    continue;
                }
                AmountCell::Value(v) => v,
                AmountCell::Invalid => {
                    return Err(AnalyticsError::Parse(format!(
                        "cannot parse '{}' as an amount in column '{}' (row {})",
                        row[amount_idx],
                        roles.amount,
                        row_no + 1
                    )))
                }
            };

            if !filter.contains(date) {
                continue;
            }

            transactions.push(Transaction {
                date,
                customer_id: row[id_idx].clone(),
                category: row[category_idx].clone(),
                amount,
            });
        }

        transactions.sort_by_key(|t| t.date);
        Ok(Self {
            transactions,
            dropped_nulls,
        })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Number of null amount cells dropped during normalization.
    pub fn dropped_nulls(&self) -> usize {
        self.dropped_nulls
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Date of the earliest retained transaction.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.transactions.first().map(|t| t.date)
    }

    /// Date of the latest retained transaction.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.transactions.last().map(|t| t.date)
    }

    /// Restrict an already-normalized table to a window. Ordering is
    /// preserved, so re-filtering is a pure slice.
    pub fn filtered(&self, filter: &DateFilter) -> Self {
        Self {
            transactions: self
                .transactions
                .iter()
                .filter(|t| filter.contains(t.date))
                .cloned()
                .collect(),
            dropped_nulls: self.dropped_nulls,
        }
    }
}

enum AmountCell {
    Value(f64),
    Null,
    Invalid,
}

fn parse_amount(cell: &str) -> AmountCell {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed.eq_ignore_ascii_case("nan") {
        return AmountCell::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => AmountCell::Value(v),
        Ok(_) => AmountCell::Null,
        Err(_) => AmountCell::Invalid,
    }
}
