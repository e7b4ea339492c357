//! Identifier key handling

use super::schema::CellType;
use super::table::{CellValue, Row};

/// Composite identifier key of a row
///
/// Keys compare with the null-safe equality of [`CellValue`], so a null
/// identifier matches another null and never a non-null value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey(pub Vec<CellValue>);

/// Builds composite keys from a fixed list of columns
///
/// Each column carries the reconciled type of both tables, so an int key on
/// one side matches the equal float key on the other.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    columns: Vec<(usize, CellType)>,
}

impl KeyBuilder {
    pub fn new(columns: Vec<(usize, CellType)>) -> Self {
        Self { columns }
    }

    /// Build the key of a row; missing cells count as null
    pub fn build_key(&self, row: &Row) -> RowKey {
        RowKey(
            self.columns
                .iter()
                .map(|&(i, cell_type)| match row.get(i) {
                    Some(cell) => cell.coerce(cell_type).into_owned(),
                    None => CellValue::Null,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key_in_index_order() {
        let row = Row::new(vec![CellValue::Int(1), "a".into(), CellValue::Null], 1);
        let key = KeyBuilder::new(vec![(2, CellType::String), (0, CellType::Int)]).build_key(&row);
        assert_eq!(key, RowKey(vec![CellValue::Null, CellValue::Int(1)]));
    }

    #[test]
    fn test_null_keys_match() {
        let builder = KeyBuilder::new(vec![(0, CellType::String)]);
        let a = builder.build_key(&Row::new(vec![CellValue::Null], 1));
        let b = builder.build_key(&Row::new(vec![CellValue::Null], 2));
        let c = builder.build_key(&Row::new(vec![CellValue::from("")], 3));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_keys_use_widened_type() {
        let builder = KeyBuilder::new(vec![(0, CellType::Float)]);
        let int_key = builder.build_key(&Row::new(vec![CellValue::Int(3)], 1));
        let float_key = builder.build_key(&Row::new(vec![CellValue::Float(3.0)], 2));
        assert_eq!(int_key, float_key);
    }
}
