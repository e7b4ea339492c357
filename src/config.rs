//! Configuration handling for rowdiff

use std::path::{Path, PathBuf};

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diff::CellComparator;
use crate::error::{DiffError, Result};

/// Output format for diff results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Csv,
}

/// How value columns are laid out in the diff output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffMode {
    /// `left_a, right_a, left_b, right_b, ...`
    #[default]
    ColumnByColumn,
    /// `left_a, left_b, ..., right_a, right_b, ...`
    SideBySide,
    /// Only the left values, unprefixed
    LeftSide,
    /// Only the right values, unprefixed
    RightSide,
}

/// Options controlling labels, column names and comparison of a diff
///
/// Values are immutable once built: every `with_*` method consumes the
/// options and returns a new value. Validation happens in
/// [`DiffOptions::validate`], which `DiffEngine::new` calls before any
/// table is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Name of the diff indicator column
    pub diff_column: String,
    /// Prefix of left-side value columns
    pub left_column_prefix: String,
    /// Prefix of right-side value columns
    pub right_column_prefix: String,
    /// Label of rows only present on the right
    pub insert_diff_value: String,
    /// Label of rows present on both sides with differing values
    pub change_diff_value: String,
    /// Label of rows only present on the left
    pub delete_diff_value: String,
    /// Label of rows present on both sides with equal values
    pub nochange_diff_value: String,
    /// Name of the optional column listing changed value columns
    pub change_column: Option<String>,
    /// Layout of value columns
    pub diff_mode: DiffMode,
    /// Null out equal values of rows present on both sides
    pub sparse_mode: bool,
    /// Columns carried through but never compared
    pub ignore_columns: Vec<String>,
    /// Comparator for value columns without a specific one
    pub default_comparator: CellComparator,
    /// Comparators for individual value columns
    pub column_comparators: IndexMap<String, CellComparator>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            diff_column: "diff".to_string(),
            left_column_prefix: "left".to_string(),
            right_column_prefix: "right".to_string(),
            insert_diff_value: "I".to_string(),
            change_diff_value: "C".to_string(),
            delete_diff_value: "D".to_string(),
            nochange_diff_value: "N".to_string(),
            change_column: None,
            diff_mode: DiffMode::default(),
            sparse_mode: false,
            ignore_columns: Vec::new(),
            default_comparator: CellComparator::default(),
            column_comparators: IndexMap::new(),
        }
    }
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON document; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse options file: {}", path.display()))
    }

    pub fn with_diff_column(mut self, name: impl Into<String>) -> Self {
        self.diff_column = name.into();
        self
    }

    pub fn with_left_column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.left_column_prefix = prefix.into();
        self
    }

    pub fn with_right_column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.right_column_prefix = prefix.into();
        self
    }

    pub fn with_insert_diff_value(mut self, value: impl Into<String>) -> Self {
        self.insert_diff_value = value.into();
        self
    }

    pub fn with_change_diff_value(mut self, value: impl Into<String>) -> Self {
        self.change_diff_value = value.into();
        self
    }

    pub fn with_delete_diff_value(mut self, value: impl Into<String>) -> Self {
        self.delete_diff_value = value.into();
        self
    }

    pub fn with_nochange_diff_value(mut self, value: impl Into<String>) -> Self {
        self.nochange_diff_value = value.into();
        self
    }

    pub fn with_change_column(mut self, name: impl Into<String>) -> Self {
        self.change_column = Some(name.into());
        self
    }

    pub fn without_change_column(mut self) -> Self {
        self.change_column = None;
        self
    }

    pub fn with_diff_mode(mut self, mode: DiffMode) -> Self {
        self.diff_mode = mode;
        self
    }

    pub fn with_sparse_mode(mut self, sparse: bool) -> Self {
        self.sparse_mode = sparse;
        self
    }

    pub fn with_ignore_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.ignore_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_comparator(mut self, comparator: CellComparator) -> Self {
        self.default_comparator = comparator;
        self
    }

    /// Compare one value column with its own comparator
    pub fn with_column_comparator(mut self, column: impl Into<String>, comparator: CellComparator) -> Self {
        self.column_comparators.insert(column.into(), comparator);
        self
    }

    /// Comparator that applies to a value column
    pub fn comparator_for(&self, column: &str) -> &CellComparator {
        self.column_comparators
            .get(column)
            .unwrap_or(&self.default_comparator)
    }

    /// The four diff labels in insert, change, delete, no-change order
    pub fn diff_values(&self) -> [&str; 4] {
        [
            self.insert_diff_value.as_str(),
            self.change_diff_value.as_str(),
            self.delete_diff_value.as_str(),
            self.nochange_diff_value.as_str(),
        ]
    }

    /// Check the options for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.diff_column.is_empty() {
            return Err(DiffError::configuration("diff column name must not be empty"));
        }
        if let Some(change_column) = &self.change_column {
            if change_column.is_empty() {
                return Err(DiffError::configuration("change column name must not be empty"));
            }
            if *change_column == self.diff_column {
                return Err(DiffError::configuration(format!(
                    "change column name '{}' must differ from diff column name",
                    change_column
                )));
            }
        }

        if self.left_column_prefix.is_empty() || self.right_column_prefix.is_empty() {
            return Err(DiffError::configuration("column prefixes must not be empty"));
        }
        if self.left_column_prefix == self.right_column_prefix {
            return Err(DiffError::configuration(format!(
                "left and right column prefix must differ, both are '{}'",
                self.left_column_prefix
            )));
        }

        let labels = self.diff_values();
        if let Some(empty) = labels.iter().position(|l| l.is_empty()) {
            return Err(DiffError::configuration(format!(
                "{} diff value must not be empty",
                LABEL_NAMES[empty]
            )));
        }
        for i in 0..labels.len() {
            for j in (i + 1)..labels.len() {
                if labels[i] == labels[j] {
                    return Err(DiffError::configuration(format!(
                        "{} and {} diff value must differ, both are '{}'",
                        LABEL_NAMES[i], LABEL_NAMES[j], labels[i]
                    )));
                }
            }
        }

        let comparators = std::iter::once(("default", &self.default_comparator)).chain(
            self.column_comparators
                .iter()
                .map(|(name, c)| (name.as_str(), c)),
        );
        for (name, comparator) in comparators {
            if let Some(tolerance) = comparator.numeric_tolerance {
                if !tolerance.is_finite() || tolerance < 0.0 {
                    return Err(DiffError::configuration(format!(
                        "numeric tolerance of {} comparator must be a non-negative number, got {}",
                        name, tolerance
                    )));
                }
            }
        }

        Ok(())
    }
}

const LABEL_NAMES: [&str; 4] = ["insert", "change", "delete", "no-change"];

/// Options for reading input files
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Column to sort rows by after reading
    pub sort_by: Option<String>,
    /// CSV field delimiter; defaults to `,` (or tab for `.tsv`)
    pub delimiter: Option<u8>,
}

/// Configuration for a command line diff run
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to the left (old) file
    pub left_file: PathBuf,
    /// Path to the right (new) file
    pub right_file: PathBuf,
    /// Identifier columns; empty means all columns
    pub id_columns: Vec<String>,
    /// Diff options
    pub options: DiffOptions,
    /// Reader options
    pub read: ReadOptions,
    /// Output format
    pub output_format: OutputFormat,
    /// Only show statistics, not the diff rows
    pub stats_only: bool,
}

impl Config {
    /// Create a new Config with file paths
    pub fn new(left_file: PathBuf, right_file: PathBuf) -> Self {
        Self {
            left_file,
            right_file,
            ..Default::default()
        }
    }

    pub fn with_id_columns(mut self, ids: Vec<String>) -> Self {
        self.id_columns = ids;
        self
    }

    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_sort_by(mut self, column: String) -> Self {
        self.read.sort_by = Some(column);
        self
    }

    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DiffOptions::default();
        assert_eq!(options.diff_column, "diff");
        assert_eq!(options.left_column_prefix, "left");
        assert_eq!(options.right_column_prefix, "right");
        assert_eq!(options.diff_values(), ["I", "C", "D", "N"]);
        assert_eq!(options.change_column, None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builders_return_new_values() {
        let base = DiffOptions::default();
        let custom = base.clone().with_diff_column("action").with_change_column("changes");
        assert_eq!(base.diff_column, "diff");
        assert_eq!(custom.diff_column, "action");
        assert_eq!(custom.change_column.as_deref(), Some("changes"));
        assert_eq!(custom.without_change_column().change_column, None);
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let err = DiffOptions::default()
            .with_change_diff_value("I")
            .validate()
            .unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("insert and change"));
    }

    #[test]
    fn test_equal_prefixes_rejected() {
        let err = DiffOptions::default()
            .with_right_column_prefix("left")
            .validate()
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_change_column_equal_to_diff_column_rejected() {
        let err = DiffOptions::default()
            .with_change_column("diff")
            .validate()
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(DiffOptions::default().with_diff_column("").validate().is_err());
        assert!(DiffOptions::default().with_nochange_diff_value("").validate().is_err());
        assert!(DiffOptions::default().with_left_column_prefix("").validate().is_err());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let options = DiffOptions::default()
            .with_column_comparator("price", CellComparator::new(false, false, Some(-1.0)));
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: DiffOptions =
            serde_json::from_str(r#"{"diff_column": "op", "diff_mode": "side-by-side"}"#).unwrap();
        assert_eq!(options.diff_column, "op");
        assert_eq!(options.diff_mode, DiffMode::SideBySide);
        assert_eq!(options.insert_diff_value, "I");
    }
}
