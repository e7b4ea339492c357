//! JSON output format

use anyhow::Result;
use indexmap::IndexMap;
use termcolor::WriteColor;

use crate::diff::DiffSummary;
use crate::model::{CellValue, Table};

use super::OutputFormatter;

/// JSON output formatter: one object per diff row, keyed by column name
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn render(&self, table: &Table, _summary: &DiffSummary, writer: &mut dyn WriteColor) -> Result<()> {
        let names = table.column_names();
        let rows: Vec<IndexMap<&str, &CellValue>> = table
            .rows
            .iter()
            .map(|row| names.iter().copied().zip(row.cells.iter()).collect())
            .collect();

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &rows)?;
        } else {
            serde_json::to_writer(&mut *writer, &rows)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::render_string;

    #[test]
    fn test_render_rows() {
        let out = render_string(&JsonOutput::compact());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["diff"], "C");
        assert_eq!(rows[1]["right_value"], "Two");
        assert!(rows[2]["right_value"].is_null());
        assert!(out.starts_with(r#"[{"diff":"N","id":1,"#));
    }
}
