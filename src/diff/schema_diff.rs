//! Schema reconciliation and identifier resolution

use rustc_hash::FxHashSet;

use crate::config::DiffOptions;
use crate::error::{SchemaError, Side};
use crate::model::{CellType, Table};

/// A column present in both tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedColumn {
    pub name: String,
    /// Position in the left table
    pub left_index: usize,
    /// Position in the right table
    pub right_index: usize,
    /// Reconciled type of both sides
    pub cell_type: CellType,
}

/// A non-identifier column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueColumn {
    pub column: SharedColumn,
    /// False for ignored columns, which are carried but never compared
    pub compared: bool,
}

/// The reconciled schema of two tables, split into identifier and value
/// columns
#[derive(Debug, Clone)]
pub struct DiffSchema {
    /// Identifier columns, in resolution order
    pub id_columns: Vec<SharedColumn>,
    /// Value columns, in left-table order
    pub value_columns: Vec<ValueColumn>,
}

impl DiffSchema {
    /// Reconcile both schemas and resolve the identifier columns
    pub fn resolve<S: AsRef<str>>(
        left: &Table,
        right: &Table,
        id_columns: &[S],
        options: &DiffOptions,
    ) -> Result<Self, SchemaError> {
        let shared = reconcile(left, right)?;

        for ignored in &options.ignore_columns {
            if !shared.iter().any(|c| &c.name == ignored) {
                return Err(SchemaError::UnknownIgnoreColumn(ignored.clone()));
            }
        }
        let ignored: FxHashSet<&str> = options.ignore_columns.iter().map(String::as_str).collect();

        let ids: Vec<SharedColumn> = if id_columns.is_empty() {
            shared
                .iter()
                .filter(|c| !ignored.contains(c.name.as_str()))
                .cloned()
                .collect()
        } else {
            let mut seen = FxHashSet::default();
            let mut ids = Vec::with_capacity(id_columns.len());
            for name in id_columns {
                let name = name.as_ref();
                if !seen.insert(name) {
                    return Err(SchemaError::DuplicateIdColumn(name.to_string()));
                }
                if ignored.contains(name) {
                    return Err(SchemaError::IgnoredIdColumn(name.to_string()));
                }
                let column = shared
                    .iter()
                    .find(|c| c.name == name)
                    .ok_or_else(|| SchemaError::UnknownIdColumn(name.to_string()))?;
                ids.push(column.clone());
            }
            ids
        };

        let id_names: FxHashSet<&str> = ids.iter().map(|c| c.name.as_str()).collect();
        let value_columns = shared
            .iter()
            .filter(|c| !id_names.contains(c.name.as_str()))
            .map(|c| ValueColumn {
                column: c.clone(),
                compared: !ignored.contains(c.name.as_str()),
            })
            .collect();

        Ok(Self {
            id_columns: ids,
            value_columns,
        })
    }

    /// Identifier names in order
    pub fn id_names(&self) -> Vec<&str> {
        self.id_columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Match the columns of both tables by name
///
/// Column order may differ between the tables; the result follows the left
/// table. Fails if a column exists on one side only or if the types of a
/// column are incompatible.
pub fn reconcile(left: &Table, right: &Table) -> Result<Vec<SharedColumn>, SchemaError> {
    check_unique_names(left, Side::Left)?;
    check_unique_names(right, Side::Right)?;

    let missing_left: Vec<String> = right
        .columns
        .iter()
        .filter(|c| left.column_index(&c.name).is_none())
        .map(|c| c.name.clone())
        .collect();
    if !missing_left.is_empty() {
        return Err(SchemaError::MissingColumns {
            side: Side::Left,
            columns: missing_left,
        });
    }

    let mut shared = Vec::with_capacity(left.column_count());
    let mut missing_right = Vec::new();
    for (left_index, left_col) in left.columns.iter().enumerate() {
        match right.column_index(&left_col.name) {
            Some(right_index) => shared.push(SharedColumn {
                name: left_col.name.clone(),
                left_index,
                right_index,
                cell_type: left_col.inferred_type,
            }),
            None => missing_right.push(left_col.name.clone()),
        }
    }
    if !missing_right.is_empty() {
        return Err(SchemaError::MissingColumns {
            side: Side::Right,
            columns: missing_right,
        });
    }

    for column in &mut shared {
        let right_type = right.columns[column.right_index].inferred_type;
        if !column.cell_type.is_compatible(right_type) {
            return Err(SchemaError::TypeMismatch {
                column: column.name.clone(),
                left: column.cell_type.to_string(),
                right: right_type.to_string(),
            });
        }
        column.cell_type = column.cell_type.widen(right_type);
    }

    Ok(shared)
}

fn check_unique_names(table: &Table, side: Side) -> Result<(), SchemaError> {
    let mut seen = FxHashSet::default();
    for column in &table.columns {
        if !seen.insert(column.name.as_str()) {
            return Err(SchemaError::DuplicateColumn {
                side,
                column: column.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn table(columns: &[(&str, CellType)]) -> Table {
        Table::from_rows(columns, Vec::<Vec<CellValue>>::new())
    }

    #[test]
    fn test_column_order_is_irrelevant() {
        let left = table(&[("id", CellType::Int), ("value", CellType::String)]);
        let right = table(&[("value", CellType::String), ("id", CellType::Int)]);
        let shared = reconcile(&left, &right).unwrap();
        assert_eq!(shared[0].name, "id");
        assert_eq!(shared[0].right_index, 1);
        assert_eq!(shared[1].right_index, 0);
    }

    #[test]
    fn test_missing_columns_named() {
        let left = table(&[("id", CellType::Int), ("extra", CellType::String)]);
        let right = table(&[("id", CellType::Int)]);
        assert_eq!(
            reconcile(&left, &right).unwrap_err(),
            SchemaError::MissingColumns {
                side: Side::Right,
                columns: vec!["extra".to_string()]
            }
        );
        assert_eq!(
            reconcile(&right, &left).unwrap_err(),
            SchemaError::MissingColumns {
                side: Side::Left,
                columns: vec!["extra".to_string()]
            }
        );
    }

    #[test]
    fn test_duplicate_column_names_rejected() {
        let left = table(&[("id", CellType::Int), ("id", CellType::Int)]);
        let right = table(&[("id", CellType::Int)]);
        assert_eq!(
            reconcile(&left, &right).unwrap_err(),
            SchemaError::DuplicateColumn {
                side: Side::Left,
                column: "id".to_string()
            }
        );
    }

    #[test]
    fn test_type_mismatch() {
        let left = table(&[("id", CellType::Int)]);
        let right = table(&[("id", CellType::String)]);
        let err = reconcile(&left, &right).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { ref column, .. } if column == "id"));
    }

    #[test]
    fn test_int_and_float_reconcile_to_float() {
        let left = table(&[("price", CellType::Float)]);
        let right = table(&[("price", CellType::Int)]);
        assert_eq!(reconcile(&left, &right).unwrap()[0].cell_type, CellType::Float);
        assert_eq!(reconcile(&right, &left).unwrap()[0].cell_type, CellType::Float);
    }

    #[test]
    fn test_all_null_column_takes_other_type() {
        let left = table(&[("a", CellType::Null)]);
        let right = table(&[("a", CellType::Date)]);
        assert_eq!(reconcile(&left, &right).unwrap()[0].cell_type, CellType::Date);
    }

    #[test]
    fn test_default_ids_are_all_columns() {
        let left = table(&[("id", CellType::Int), ("value", CellType::String)]);
        let schema = DiffSchema::resolve(&left, &left, &[] as &[&str], &DiffOptions::default()).unwrap();
        assert_eq!(schema.id_names(), vec!["id", "value"]);
        assert!(schema.value_columns.is_empty());
    }

    #[test]
    fn test_explicit_ids_keep_caller_order() {
        let left = table(&[
            ("a", CellType::Int),
            ("b", CellType::Int),
            ("c", CellType::Int),
        ]);
        let schema = DiffSchema::resolve(&left, &left, &["c", "a"], &DiffOptions::default()).unwrap();
        assert_eq!(schema.id_names(), vec!["c", "a"]);
        let values: Vec<_> = schema.value_columns.iter().map(|v| v.column.name.as_str()).collect();
        assert_eq!(values, vec!["b"]);
    }

    #[test]
    fn test_bad_ids_rejected() {
        let left = table(&[("id", CellType::Int), ("value", CellType::String)]);
        let options = DiffOptions::default();
        assert_eq!(
            DiffSchema::resolve(&left, &left, &["nope"], &options).unwrap_err(),
            SchemaError::UnknownIdColumn("nope".to_string())
        );
        assert_eq!(
            DiffSchema::resolve(&left, &left, &["id", "id"], &options).unwrap_err(),
            SchemaError::DuplicateIdColumn("id".to_string())
        );
    }

    #[test]
    fn test_ignored_columns() {
        let left = table(&[
            ("id", CellType::Int),
            ("value", CellType::String),
            ("updated", CellType::DateTime),
        ]);
        let options = DiffOptions::default().with_ignore_columns(["updated"]);

        let schema = DiffSchema::resolve(&left, &left, &[] as &[&str], &options).unwrap();
        assert_eq!(schema.id_names(), vec!["id", "value"]);
        assert_eq!(schema.value_columns.len(), 1);
        assert!(!schema.value_columns[0].compared);

        assert_eq!(
            DiffSchema::resolve(&left, &left, &["updated"], &options).unwrap_err(),
            SchemaError::IgnoredIdColumn("updated".to_string())
        );

        let options = DiffOptions::default().with_ignore_columns(["missing"]);
        assert_eq!(
            DiffSchema::resolve(&left, &left, &["id"], &options).unwrap_err(),
            SchemaError::UnknownIgnoreColumn("missing".to_string())
        );
    }
}
