//! Shared series and curve-fitting primitives.

pub mod monthly;
pub mod trend;

pub use monthly::{month_start, months_after, MonthlyAggregate, MonthlySeries};
pub use trend::{linear_fit, TrendLine};
