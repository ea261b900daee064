//! Error types for the salescope crate.

use thiserror::Error;

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while normalizing data, aggregating metrics or
/// fitting the sales forecast.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A cell could not be parsed under the declared column roles.
    /// Usually means the wrong column was assigned to a role.
    #[error("parse error: {0}")]
    Parse(String),

    /// A named column is missing from the input table.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// Date filter bounds are inverted.
    #[error("invalid date filter: start {start} is after end {end}")]
    InvalidFilter {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Not enough periods for a meaningful split or seasonal fit.
    #[error("insufficient data: need at least {needed} periods, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Model fitting failed outright.
    #[error("forecast error: {0}")]
    Forecast(String),

    /// A parameter is outside its allowed range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from CSV parsing.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from IO operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn error_messages_are_descriptive() {
        let err = AnalyticsError::InsufficientData { needed: 12, got: 7 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 12 periods, got 7"
        );

        let err = AnalyticsError::InvalidFilter {
            start: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "invalid date filter: start 2023-03-01 is after end 2023-01-01"
        );

        let err = AnalyticsError::MissingColumn("Order_Date".to_string());
        assert_eq!(err.to_string(), "missing column: Order_Date");
    }
}
