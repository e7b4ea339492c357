//! rowdiff - Keyed row-level diff for tabular data
//!
//! Compares two tables sharing a schema and labels every row as inserted,
//! changed, deleted or unchanged. Rows are matched on identifier columns
//! with null-safe equality; without identifier columns, whole rows are
//! matched.
//!
//! ```
//! use rowdiff::model::{CellType, CellValue, Table};
//!
//! let columns = [("id", CellType::Int), ("value", CellType::String)];
//! let left = Table::from_rows(&columns, vec![vec![CellValue::Int(1), "one".into()]]);
//! let right = Table::from_rows(&columns, vec![vec![CellValue::Int(1), "uno".into()]]);
//!
//! let diff = rowdiff::diff(&left, &right, &["id"]).unwrap();
//! assert_eq!(diff.column_names(), vec!["diff", "id", "left_value", "right_value"]);
//! assert_eq!(diff.cell(0, "diff"), Some(&CellValue::from("C")));
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;

pub use config::{Config, DiffMode, DiffOptions};
pub use diff::{CellComparator, DiffEngine, DiffKind, DiffRow, DiffSummary};
pub use error::{DiffError, Result, SchemaError};
pub use model::Table;

/// Diff two tables with default options
pub fn diff<S: AsRef<str>>(left: &Table, right: &Table, id_columns: &[S]) -> Result<Table> {
    diff_with_options(left, right, &DiffOptions::default(), id_columns)
}

/// Diff two tables with the given options
pub fn diff_with_options<S: AsRef<str>>(
    left: &Table,
    right: &Table,
    options: &DiffOptions,
    id_columns: &[S],
) -> Result<Table> {
    DiffEngine::new(options.clone())?.diff(left, right, id_columns)
}
