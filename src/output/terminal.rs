//! Colored terminal output

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::diff::DiffSummary;
use crate::model::Table;

use super::OutputFormatter;

/// Terminal output: a colored summary line followed by a box-drawn table
pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the per-label counts, colored by kind
pub fn write_summary(summary: &DiffSummary, writer: &mut dyn WriteColor) -> Result<()> {
    let parts = [
        (format!("+{} inserted", summary.inserted), Some(Color::Green)),
        (format!("~{} changed", summary.changed), Some(Color::Yellow)),
        (format!("-{} deleted", summary.deleted), Some(Color::Red)),
        (format!("{} unchanged", summary.unchanged), None),
    ];

    write!(writer, "Summary: ")?;
    for (i, (text, color)) in parts.iter().enumerate() {
        if i > 0 {
            write!(writer, ", ")?;
        }
        writer.set_color(ColorSpec::new().set_fg(*color).set_bold(color.is_some()))?;
        write!(writer, "{}", text)?;
        writer.reset()?;
    }
    writeln!(writer, " ({} rows)", summary.total())?;
    Ok(())
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, table: &Table, summary: &DiffSummary, writer: &mut dyn WriteColor) -> Result<()> {
        write_summary(summary, writer)?;

        if !summary.has_changes() {
            writeln!(writer, "No differences found.")?;
            return Ok(());
        }

        writeln!(writer)?;
        writeln!(writer, "{}", build_table(table))?;
        Ok(())
    }
}

fn build_table(table: &Table) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.column_names().into_iter().map(String::from));
    for row in &table.rows {
        builder.push_record(row.cells.iter().map(|c| c.display().into_owned()));
    }

    let mut rendered = builder.build();
    rendered.with(Style::modern());
    rendered.to_string()
}
