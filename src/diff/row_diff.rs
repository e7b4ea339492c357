//! Null-safe full outer join of two tables on their identifier columns

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{KeyBuilder, Row, RowKey, Table};

use super::schema_diff::DiffSchema;

/// One output pair of the join: at least one side is present
pub type JoinPair<'a> = (Option<&'a Row>, Option<&'a Row>);

/// Row matcher using a hash index over the right table's keys
pub struct RowMatcher {
    left_keys: KeyBuilder,
    right_keys: KeyBuilder,
}

impl RowMatcher {
    /// Create a matcher joining on the identifier columns of `schema`
    pub fn new(schema: &DiffSchema) -> Self {
        Self {
            left_keys: KeyBuilder::new(
                schema
                    .id_columns
                    .iter()
                    .map(|c| (c.left_index, c.cell_type))
                    .collect(),
            ),
            right_keys: KeyBuilder::new(
                schema
                    .id_columns
                    .iter()
                    .map(|c| (c.right_index, c.cell_type))
                    .collect(),
            ),
        }
    }

    /// Match rows between left and right tables
    ///
    /// Every left row appears with each right row of the same key (all
    /// combinations when a key is duplicated), or alone if its key is absent
    /// on the right. Right rows whose key is absent on the left follow at the
    /// end, in input order.
    pub fn match_rows<'a>(&self, left: &'a Table, right: &'a Table) -> Vec<JoinPair<'a>> {
        let left_keys: Vec<RowKey> = left
            .rows
            .par_iter()
            .map(|row| self.left_keys.build_key(row))
            .collect();
        let right_keys: Vec<RowKey> = right
            .rows
            .par_iter()
            .map(|row| self.right_keys.build_key(row))
            .collect();

        let mut right_index: FxHashMap<&RowKey, Vec<usize>> = FxHashMap::default();
        for (idx, key) in right_keys.iter().enumerate() {
            right_index.entry(key).or_default().push(idx);
        }
        let left_key_set: FxHashSet<&RowKey> = left_keys.iter().collect();

        let mut matches: Vec<JoinPair<'a>> = left_keys
            .par_iter()
            .zip(left.rows.par_iter())
            .flat_map_iter(|(key, left_row)| {
                let pairs: Vec<JoinPair<'a>> = match right_index.get(key) {
                    Some(indices) => indices
                        .iter()
                        .map(|&i| (Some(left_row), Some(&right.rows[i])))
                        .collect(),
                    None => vec![(Some(left_row), None)],
                };
                pairs
            })
            .collect();

        matches.extend(
            right_keys
                .iter()
                .zip(right.rows.iter())
                .filter(|(key, _)| !left_key_set.contains(key))
                .map(|(_, row)| (None, Some(row))),
        );

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiffOptions;
    use crate::model::{CellType, CellValue};

    fn table(rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_rows(&[("id", CellType::Int), ("value", CellType::String)], rows)
    }

    fn matcher(left: &Table, right: &Table, ids: &[&str]) -> RowMatcher {
        RowMatcher::new(&DiffSchema::resolve(left, right, ids, &DiffOptions::default()).unwrap())
    }

    fn describe(pairs: &[JoinPair<'_>]) -> Vec<(Option<usize>, Option<usize>)> {
        pairs
            .iter()
            .map(|(l, r)| (l.map(|r| r.source_line), r.map(|r| r.source_line)))
            .collect()
    }

    #[test]
    fn test_full_outer_join() {
        let left = table(vec![
            vec![CellValue::Int(1), "one".into()],
            vec![CellValue::Int(3), "three".into()],
        ]);
        let right = table(vec![
            vec![CellValue::Int(4), "four".into()],
            vec![CellValue::Int(1), "uno".into()],
        ]);
        let pairs = matcher(&left, &right, &["id"]).match_rows(&left, &right);
        assert_eq!(
            describe(&pairs),
            vec![(Some(1), Some(2)), (Some(2), None), (None, Some(1))]
        );
    }

    #[test]
    fn test_null_keys_match_each_other_only() {
        let left = table(vec![
            vec![CellValue::Null, "a".into()],
            vec![CellValue::Int(0), "b".into()],
        ]);
        let right = table(vec![vec![CellValue::Null, "c".into()]]);
        let pairs = matcher(&left, &right, &["id"]).match_rows(&left, &right);
        assert_eq!(describe(&pairs), vec![(Some(1), Some(1)), (Some(2), None)]);
    }

    #[test]
    fn test_duplicate_keys_cross_product() {
        let left = table(vec![
            vec![CellValue::Int(1), "a".into()],
            vec![CellValue::Int(1), "b".into()],
        ]);
        let right = table(vec![
            vec![CellValue::Int(1), "c".into()],
            vec![CellValue::Int(1), "d".into()],
        ]);
        let pairs = matcher(&left, &right, &["id"]).match_rows(&left, &right);
        assert_eq!(
            describe(&pairs),
            vec![
                (Some(1), Some(1)),
                (Some(1), Some(2)),
                (Some(2), Some(1)),
                (Some(2), Some(2)),
            ]
        );
    }

    #[test]
    fn test_empty_tables() {
        let left = table(Vec::new());
        let right = table(vec![vec![CellValue::Int(1), "a".into()]]);
        let pairs = matcher(&left, &right, &[]).match_rows(&left, &right);
        assert_eq!(describe(&pairs), vec![(None, Some(1))]);
    }
}
