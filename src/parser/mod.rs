//! Readers turning tabular data files into tables

mod csv;
mod json;
mod parquet;

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info};

use crate::config::ReadOptions;
use crate::model::{CellType, CellValue, Table};

pub use self::csv::CsvParser;
pub use self::json::JsonParser;
pub use self::parquet::ParquetParser;

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table
    fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;

    /// Whether every typed cell this parser produces displays as the text
    /// it was read from
    fn preserves_text(&self) -> bool {
        false
    }
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(CsvParser),
                Box::new(ParquetParser),
                Box::new(JsonParser),
            ],
        }
    }

    /// Get a parser for the given file path, sniffing the content when the
    /// extension is missing or unknown
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if let Some(parser) = self.by_extension(&ext) {
            return Ok(parser);
        }

        if let Some(detected) = detect_format(path) {
            if let Some(parser) = self.by_extension(detected) {
                return Ok(parser);
            }
        }

        bail!(
            "Unsupported file format: {}",
            if ext.is_empty() { "unknown" } else { ext.as_str() }
        )
    }

    fn by_extension(&self, ext: &str) -> Option<&dyn Parser> {
        self.parsers
            .iter()
            .find(|p| p.supports_extension(ext))
            .map(|p| p.as_ref())
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table> {
        let parser = self.get_parser(path)?;
        let mut table = parser.parse(path, options)?;

        if let Some(ref sort_col) = options.sort_by {
            if table.column_index(sort_col).is_none() {
                bail!("Cannot sort {} by unknown column '{}'", path.display(), sort_col);
            }
            table.sort_by_column(sort_col);
        }

        info!(
            "Read {} rows and {} columns from {}",
            table.row_count(),
            table.column_count(),
            path.display()
        );
        Ok(table)
    }

    /// Parse the two sides of a diff
    ///
    /// When both files are text formats, columns typed differently on the two
    /// sides fall back to their original text so they can still be compared.
    pub fn parse_pair(&self, left: &Path, right: &Path, options: &ReadOptions) -> Result<(Table, Table)> {
        let mut left_table = self
            .parse(left, options)
            .with_context(|| format!("Failed to parse left file: {}", left.display()))?;
        let mut right_table = self
            .parse(right, options)
            .with_context(|| format!("Failed to parse right file: {}", right.display()))?;

        if self.get_parser(left)?.preserves_text() && self.get_parser(right)?.preserves_text() {
            align_text_columns(&mut left_table, &mut right_table);
        }
        Ok((left_table, right_table))
    }
}

/// Turn same-named columns whose types cannot be compared back into text
pub fn align_text_columns(left: &mut Table, right: &mut Table) {
    for left_idx in 0..left.columns.len() {
        let Some(right_idx) = right.column_index(&left.columns[left_idx].name) else {
            continue;
        };
        let left_type = left.columns[left_idx].inferred_type;
        let right_type = right.columns[right_idx].inferred_type;
        if left_type.is_compatible(right_type) {
            continue;
        }

        debug!(
            "comparing column '{}' as text ({} on the left, {} on the right)",
            left.columns[left_idx].name, left_type, right_type
        );
        as_text(left, left_idx);
        as_text(right, right_idx);
    }
}

fn as_text(table: &mut Table, col_idx: usize) {
    table.columns[col_idx].inferred_type = CellType::String;
    for row in &mut table.rows {
        if let Some(cell) = row.cells.get_mut(col_idx) {
            if !cell.is_null() && !matches!(cell, CellValue::String(_)) {
                let text = cell.display().into_owned();
                *cell = CellValue::from(text);
            }
        }
    }
}

/// Detect file format from content (for files without extension)
pub fn detect_format(path: &Path) -> Option<&'static str> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer).ok()?;

    if &buffer == b"PAR1" {
        return Some("parquet");
    }

    let mut first_line = String::from_utf8_lossy(&buffer).into_owned();
    reader.read_line(&mut first_line).ok()?;
    let trimmed = first_line.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Some("json");
    }

    Some("csv")
}

/// Open an input file, naming it in the error
fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))
}
