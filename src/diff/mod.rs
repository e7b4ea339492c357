//! Diff engine for comparing tables

pub mod cell_diff;
mod layout;
mod row_diff;
mod schema_diff;

use std::borrow::Cow;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::DiffOptions;
use crate::error::{DiffError, Result};
use crate::model::{CellType, CellValue, Column, Row, Table};

pub use cell_diff::CellComparator;
pub use layout::{OutputLayout, Slot};
pub use row_diff::{JoinPair, RowMatcher};
pub use schema_diff::{reconcile, DiffSchema, SharedColumn, ValueColumn};

/// Classification of one join pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    /// Only present on the right
    Insert,
    /// Present on both sides, some compared value differs
    Change,
    /// Only present on the left
    Delete,
    /// Present on both sides, all compared values equal
    NoChange,
}

impl DiffKind {
    /// The configured label of this kind
    pub fn label(self, options: &DiffOptions) -> &str {
        match self {
            DiffKind::Insert => &options.insert_diff_value,
            DiffKind::Change => &options.change_diff_value,
            DiffKind::Delete => &options.delete_diff_value,
            DiffKind::NoChange => &options.nochange_diff_value,
        }
    }

    /// Parse a label back into its kind
    pub fn from_label(label: &str, options: &DiffOptions) -> Option<Self> {
        [
            DiffKind::Insert,
            DiffKind::Change,
            DiffKind::Delete,
            DiffKind::NoChange,
        ]
        .into_iter()
        .find(|kind| kind.label(options) == label)
    }
}

/// A classified join pair
#[derive(Debug, Clone)]
struct ClassifiedRow<'a> {
    kind: DiffKind,
    left: Option<&'a Row>,
    right: Option<&'a Row>,
    /// Per value column: true if both sides are present and the values differ
    differs: Vec<bool>,
}

/// Row counts per diff label
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub inserted: usize,
    pub changed: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    /// Count the rows of a diff output by their diff column
    pub fn from_table(table: &Table, options: &DiffOptions) -> Self {
        let mut summary = Self::default();
        let Some(idx) = table.column_index(&options.diff_column) else {
            return summary;
        };
        for row in &table.rows {
            let kind = row
                .get(idx)
                .and_then(CellValue::as_str)
                .and_then(|label| DiffKind::from_label(label, options));
            match kind {
                Some(DiffKind::Insert) => summary.inserted += 1,
                Some(DiffKind::Change) => summary.changed += 1,
                Some(DiffKind::Delete) => summary.deleted += 1,
                Some(DiffKind::NoChange) => summary.unchanged += 1,
                None => {}
            }
        }
        summary
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.inserted > 0 || self.changed > 0 || self.deleted > 0
    }

    /// Total number of output rows
    pub fn total(&self) -> usize {
        self.inserted + self.changed + self.deleted + self.unchanged
    }
}

/// Name-based view of one diff output row, handed to `diff_as` decoders
#[derive(Debug, Clone, Copy)]
pub struct DiffRow<'a> {
    columns: &'a [Column],
    row: &'a Row,
}

impl<'a> DiffRow<'a> {
    /// Cell of a column by name
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        let idx = self.columns.iter().position(|c| c.name == column)?;
        self.row.get(idx)
    }

    /// String cell of a column by name; `None` for nulls and other types
    pub fn get_str(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(CellValue::as_str)
    }

    pub fn columns(&self) -> &'a [Column] {
        self.columns
    }

    pub fn cells(&self) -> &'a [CellValue] {
        &self.row.cells
    }
}

/// Main diff engine
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    /// Create a diff engine; fails if the options are inconsistent
    pub fn new(options: DiffOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Compare two tables
    ///
    /// With no `id_columns`, every column (except ignored ones) identifies a
    /// row and rows are only ever inserted, deleted or unchanged.
    pub fn diff<S: AsRef<str>>(&self, left: &Table, right: &Table, id_columns: &[S]) -> Result<Table> {
        let (schema, layout) = self.prepare(left, right, id_columns)?;
        let pairs = RowMatcher::new(&schema).match_rows(left, right);

        let rows: Vec<Row> = pairs
            .par_iter()
            .enumerate()
            .map(|(i, pair)| {
                let classified = self.classify(&schema, pair);
                Row::new(self.emit(&schema, &layout, &classified), i + 1)
            })
            .collect();

        debug!(
            "diff produced {} rows from {} left and {} right rows",
            rows.len(),
            left.row_count(),
            right.row_count()
        );

        Ok(Table {
            columns: layout.columns,
            rows,
        })
    }

    /// Compare two tables and decode every output row into a `U`
    pub fn diff_as<S, U, E, F>(
        &self,
        left: &Table,
        right: &Table,
        id_columns: &[S],
        mut decoder: F,
    ) -> std::result::Result<Vec<U>, E>
    where
        S: AsRef<str>,
        E: From<DiffError>,
        F: FnMut(DiffRow<'_>) -> std::result::Result<U, E>,
    {
        let table = self.diff(left, right, id_columns)?;
        let mut decoded = Vec::with_capacity(table.row_count());
        for row in &table.rows {
            decoded.push(decoder(DiffRow {
                columns: &table.columns,
                row,
            })?);
        }
        Ok(decoded)
    }

    /// Compare two tables and return each join pair as its label plus the
    /// original left and right rows
    pub fn diff_with<S: AsRef<str>>(
        &self,
        left: &Table,
        right: &Table,
        id_columns: &[S],
    ) -> Result<Vec<(String, Option<Row>, Option<Row>)>> {
        let (schema, _) = self.prepare(left, right, id_columns)?;
        let pairs = RowMatcher::new(&schema).match_rows(left, right);

        Ok(pairs
            .par_iter()
            .map(|pair| {
                let classified = self.classify(&schema, pair);
                (
                    classified.kind.label(&self.options).to_string(),
                    classified.left.cloned(),
                    classified.right.cloned(),
                )
            })
            .collect())
    }

    fn prepare<S: AsRef<str>>(
        &self,
        left: &Table,
        right: &Table,
        id_columns: &[S],
    ) -> Result<(DiffSchema, OutputLayout)> {
        let schema = DiffSchema::resolve(left, right, id_columns, &self.options)?;
        let layout = OutputLayout::new(&schema, &self.options)?;
        debug!(
            "diffing on id columns [{}] with {} value columns; output columns [{}]",
            schema.id_names().join(", "),
            schema.value_columns.len(),
            layout.column_names().join(", ")
        );
        Ok((schema, layout))
    }

    fn classify<'a>(&self, schema: &DiffSchema, pair: &JoinPair<'a>) -> ClassifiedRow<'a> {
        let (left, right) = *pair;
        let (kind, differs) = match (left, right) {
            (Some(l), Some(r)) => {
                let differs: Vec<bool> = schema
                    .value_columns
                    .iter()
                    .map(|value| {
                        let column = &value.column;
                        let lv = l.get(column.left_index).unwrap_or(&NULL).coerce(column.cell_type);
                        let rv = r.get(column.right_index).unwrap_or(&NULL).coerce(column.cell_type);
                        !self.options.comparator_for(&column.name).equal(&lv, &rv)
                    })
                    .collect();
                let changed = schema
                    .value_columns
                    .iter()
                    .zip(&differs)
                    .any(|(value, &d)| value.compared && d);
                let kind = if changed {
                    DiffKind::Change
                } else {
                    DiffKind::NoChange
                };
                (kind, differs)
            }
            (Some(_), None) => (DiffKind::Delete, Vec::new()),
            (None, Some(_)) => (DiffKind::Insert, Vec::new()),
            (None, None) => unreachable!("join pairs always have a side"),
        };

        ClassifiedRow {
            kind,
            left,
            right,
            differs,
        }
    }

    fn emit(&self, schema: &DiffSchema, layout: &OutputLayout, row: &ClassifiedRow<'_>) -> Vec<CellValue> {
        let both_sides = row.left.is_some() && row.right.is_some();
        let hide = |value_idx: usize| {
            self.options.sparse_mode && both_sides && !row.differs.get(value_idx).copied().unwrap_or(true)
        };

        layout
            .slots
            .iter()
            .map(|slot| match *slot {
                Slot::Diff => CellValue::String(Cow::Owned(row.kind.label(&self.options).to_string())),
                Slot::Change => {
                    if both_sides {
                        CellValue::List(
                            schema
                                .value_columns
                                .iter()
                                .zip(&row.differs)
                                .filter(|(value, d)| value.compared && **d)
                                .map(|(value, _)| CellValue::from(value.column.name.as_str()))
                                .collect(),
                        )
                    } else {
                        CellValue::Null
                    }
                }
                Slot::Id(i) => {
                    let column = &schema.id_columns[i];
                    match (row.left, row.right) {
                        (Some(l), _) => cell(l, column.left_index, column.cell_type),
                        (None, Some(r)) => cell(r, column.right_index, column.cell_type),
                        (None, None) => CellValue::Null,
                    }
                }
                Slot::Left(i) => match row.left {
                    Some(l) if !hide(i) => {
                        let column = &schema.value_columns[i].column;
                        cell(l, column.left_index, column.cell_type)
                    }
                    _ => CellValue::Null,
                },
                Slot::Right(i) => match row.right {
                    Some(r) if !hide(i) => {
                        let column = &schema.value_columns[i].column;
                        cell(r, column.right_index, column.cell_type)
                    }
                    _ => CellValue::Null,
                },
            })
            .collect()
    }
}

static NULL: CellValue = CellValue::Null;

/// Cell of a source row, widened to the reconciled column type
fn cell(row: &Row, index: usize, cell_type: CellType) -> CellValue {
    row.get(index)
        .map_or(CellValue::Null, |c| c.coerce(cell_type).into_owned())
}
