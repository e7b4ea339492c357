//! Output formatting for diff results

mod csv;
mod json;
mod terminal;

use std::borrow::Cow;

use anyhow::Result;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::config::OutputFormat;
use crate::diff::DiffSummary;
use crate::model::{CellValue, Table};

pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::terminal::{write_summary, TerminalOutput};

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render a diff table to a writer
    fn render(&self, table: &Table, summary: &DiffSummary, writer: &mut dyn WriteColor) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: OutputFormat) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
            OutputFormat::Csv => Box::new(CsvOutput),
        }
    }
}

/// Render a diff table to stdout
pub fn render_to_stdout(
    table: &Table,
    summary: &DiffSummary,
    format: OutputFormat,
    color: ColorChoice,
) -> Result<()> {
    let formatter = OutputFactory::create(format);
    let mut stdout = StandardStream::stdout(color);
    formatter.render(table, summary, &mut stdout)
}

/// Plain text of a cell as written by the text formats; nulls are empty
fn cell_text(value: &CellValue) -> Cow<'_, str> {
    if value.is_null() {
        Cow::Borrowed("")
    } else {
        value.display()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use termcolor::NoColor;

    use super::OutputFormatter;
    use crate::diff::DiffSummary;
    use crate::model::{CellType, CellValue, Table};

    pub fn sample_diff() -> (Table, DiffSummary) {
        let table = Table::from_rows(
            &[
                ("diff", CellType::String),
                ("id", CellType::Int),
                ("left_value", CellType::String),
                ("right_value", CellType::String),
            ],
            vec![
                vec!["N".into(), CellValue::Int(1), "one".into(), "one".into()],
                vec!["C".into(), CellValue::Int(2), "two".into(), "Two".into()],
                vec!["D".into(), CellValue::Int(3), "three".into(), CellValue::Null],
            ],
        );
        let summary = DiffSummary {
            inserted: 0,
            changed: 1,
            deleted: 1,
            unchanged: 1,
        };
        (table, summary)
    }

    pub fn render_string(formatter: &dyn OutputFormatter) -> String {
        let (table, summary) = sample_diff();
        let mut out = NoColor::new(Vec::new());
        formatter.render(&table, &summary, &mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }
}
