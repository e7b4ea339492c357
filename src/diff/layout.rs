//! Output schema of a diff

use rustc_hash::FxHashSet;

use crate::config::{DiffMode, DiffOptions};
use crate::error::{DiffError, Result};
use crate::model::{CellType, Column};

use super::schema_diff::DiffSchema;

/// Where the cell of an output column comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The diff label
    Diff,
    /// The list of changed value columns
    Change,
    /// Identifier column `n` of the schema
    Id(usize),
    /// Left value of value column `n`
    Left(usize),
    /// Right value of value column `n`
    Right(usize),
}

/// Output columns and the slot feeding each of them
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub columns: Vec<Column>,
    pub slots: Vec<Slot>,
}

impl OutputLayout {
    /// Lay out the diff column, the change column, the identifiers and the
    /// value columns according to the diff mode
    pub fn new(schema: &DiffSchema, options: &DiffOptions) -> Result<Self> {
        let mut layout = Self {
            columns: Vec::new(),
            slots: Vec::new(),
        };

        layout.push(options.diff_column.clone(), CellType::String, Slot::Diff);
        if let Some(change_column) = &options.change_column {
            layout.push(change_column.clone(), CellType::List, Slot::Change);
        }
        for (i, id) in schema.id_columns.iter().enumerate() {
            layout.push(id.name.clone(), id.cell_type, Slot::Id(i));
        }

        let left = |name: &str| format!("{}_{}", options.left_column_prefix, name);
        let right = |name: &str| format!("{}_{}", options.right_column_prefix, name);
        let values = schema.value_columns.iter().enumerate();
        match options.diff_mode {
            DiffMode::ColumnByColumn => {
                for (i, value) in values {
                    let column = &value.column;
                    layout.push(left(&column.name), column.cell_type, Slot::Left(i));
                    layout.push(right(&column.name), column.cell_type, Slot::Right(i));
                }
            }
            DiffMode::SideBySide => {
                for (i, value) in values.clone() {
                    layout.push(left(&value.column.name), value.column.cell_type, Slot::Left(i));
                }
                for (i, value) in values {
                    layout.push(right(&value.column.name), value.column.cell_type, Slot::Right(i));
                }
            }
            DiffMode::LeftSide => {
                for (i, value) in values {
                    layout.push(value.column.name.clone(), value.column.cell_type, Slot::Left(i));
                }
            }
            DiffMode::RightSide => {
                for (i, value) in values {
                    layout.push(value.column.name.clone(), value.column.cell_type, Slot::Right(i));
                }
            }
        }

        layout.check_unique_names()?;
        Ok(layout)
    }

    fn push(&mut self, name: String, cell_type: CellType, slot: Slot) {
        let index = self.columns.len();
        self.columns.push(Column::with_type(name, index, cell_type));
        self.slots.push(slot);
    }

    fn check_unique_names(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for (column, slot) in self.columns.iter().zip(&self.slots) {
            if !seen.insert(column.name.as_str()) {
                let what = match slot {
                    Slot::Diff => "diff column",
                    Slot::Change => "change column",
                    Slot::Id(_) => "id column",
                    Slot::Left(_) | Slot::Right(_) => "value column",
                };
                return Err(DiffError::configuration(format!(
                    "{} name '{}' collides with another output column",
                    what, column.name
                )));
            }
        }
        Ok(())
    }

    /// Output column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Table};

    fn schema(columns: &[(&str, CellType)], ids: &[&str], options: &DiffOptions) -> DiffSchema {
        let table = Table::from_rows(columns, Vec::<Vec<CellValue>>::new());
        DiffSchema::resolve(&table, &table, ids, options).unwrap()
    }

    const COLUMNS: &[(&str, CellType)] = &[
        ("id", CellType::Int),
        ("a", CellType::String),
        ("b", CellType::Float),
    ];

    #[test]
    fn test_column_by_column() {
        let options = DiffOptions::default();
        let layout = OutputLayout::new(&schema(COLUMNS, &["id"], &options), &options).unwrap();
        assert_eq!(
            layout.column_names(),
            vec!["diff", "id", "left_a", "right_a", "left_b", "right_b"]
        );
        assert_eq!(layout.columns[5].inferred_type, CellType::Float);
        assert_eq!(layout.columns[5].index, 5);
    }

    #[test]
    fn test_change_column_follows_diff_column() {
        let options = DiffOptions::default()
            .with_change_column("changes")
            .with_diff_mode(DiffMode::SideBySide);
        let layout = OutputLayout::new(&schema(COLUMNS, &["id"], &options), &options).unwrap();
        assert_eq!(
            layout.column_names(),
            vec!["diff", "changes", "id", "left_a", "left_b", "right_a", "right_b"]
        );
        assert_eq!(layout.slots[1], Slot::Change);
    }

    #[test]
    fn test_single_side_modes() {
        let options = DiffOptions::default().with_diff_mode(DiffMode::RightSide);
        let layout = OutputLayout::new(&schema(COLUMNS, &["id"], &options), &options).unwrap();
        assert_eq!(layout.column_names(), vec!["diff", "id", "a", "b"]);
        assert_eq!(layout.slots[2], Slot::Right(0));
    }

    #[test]
    fn test_no_value_columns_without_ids() {
        let options = DiffOptions::default();
        let layout = OutputLayout::new(&schema(COLUMNS, &[], &options), &options).unwrap();
        assert_eq!(layout.column_names(), vec!["diff", "id", "a", "b"]);
        assert!(layout.slots.iter().all(|s| matches!(s, Slot::Diff | Slot::Id(_))));
    }

    #[test]
    fn test_diff_column_colliding_with_id() {
        let options = DiffOptions::default().with_diff_column("id");
        let err = OutputLayout::new(&schema(COLUMNS, &["id"], &options), &options).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_prefixed_name_colliding_with_id() {
        let columns = &[
            ("left_a", CellType::Int),
            ("a", CellType::String),
        ];
        let options = DiffOptions::default();
        let err = OutputLayout::new(&schema(columns, &["left_a"], &options), &options).unwrap_err();
        assert!(err.to_string().contains("left_a"));
    }

    #[test]
    fn test_prefixed_names_colliding_with_each_other() {
        let columns = &[
            ("id", CellType::Int),
            ("x_a", CellType::String),
            ("a", CellType::String),
        ];
        let options = DiffOptions::default()
            .with_left_column_prefix("left_x")
            .with_right_column_prefix("left");
        // the right name of x_a and the left name of a are both left_x_a
        let err = OutputLayout::new(&schema(columns, &["id"], &options), &options).unwrap_err();
        assert!(err.is_configuration_error());
    }
}
