//! CSV output format

use anyhow::{Context, Result};
use termcolor::WriteColor;

use crate::diff::DiffSummary;
use crate::model::Table;

use super::{cell_text, OutputFormatter};

/// CSV output: header plus one record per diff row, nulls left empty
pub struct CsvOutput;

impl OutputFormatter for CsvOutput {
    fn render(&self, table: &Table, _summary: &DiffSummary, writer: &mut dyn WriteColor) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(table.column_names())
            .context("Failed to write CSV header")?;
        for row in &table.rows {
            csv_writer
                .write_record(row.cells.iter().map(|c| cell_text(c).into_owned()))
                .with_context(|| format!("Failed to write CSV row {}", row.source_line))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::render_string;

    #[test]
    fn test_render_rows() {
        let out = render_string(&CsvOutput);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "diff,id,left_value,right_value",
                "N,1,one,one",
                "C,2,two,Two",
                "D,3,three,",
            ]
        );
    }
}
