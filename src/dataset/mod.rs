//! Dataset loading and normalization.

pub mod loader;
pub mod normalize;

pub use loader::{load_csv, load_csv_bytes, RawTable, MIN_COLUMNS};
pub use normalize::{ColumnRoles, DateFilter, DateFormat, NormalizedTable, Transaction};
