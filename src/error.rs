//! Error types for diff operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiffError>;

/// Which input table a schema problem was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// The two tables, or the identifier columns, do not fit together
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("columns missing from the {side} table: {}", .columns.join(", "))]
    MissingColumns { side: Side, columns: Vec<String> },

    #[error("column '{column}' appears more than once in the {side} table")]
    DuplicateColumn { side: Side, column: String },

    #[error("column '{column}' has type {left} on the left but {right} on the right")]
    TypeMismatch {
        column: String,
        left: String,
        right: String,
    },

    #[error("id column '{0}' does not exist")]
    UnknownIdColumn(String),

    #[error("id column '{0}' is given more than once")]
    DuplicateIdColumn(String),

    #[error("ignored column '{0}' does not exist")]
    UnknownIgnoreColumn(String),

    #[error("column '{0}' cannot be both an id column and ignored")]
    IgnoredIdColumn(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DiffError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True for schema problems, including type mismatches
    pub fn is_schema_error(&self) -> bool {
        matches!(self, DiffError::Schema(_))
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, DiffError::Configuration(_))
    }
}
