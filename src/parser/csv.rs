//! CSV file parser
//!
//! Cells are read verbatim. A column is typed only when every non-empty cell
//! parses to a value whose display is the original text, so typing never
//! hides a difference such as `007` against `7`. Empty fields are null.

use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::config::ReadOptions;
use crate::model::{CellType, CellValue, Column, Table};

use super::Parser;

pub(crate) const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

type CellParser = fn(&str) -> Option<CellValue>;

/// Column types tried in order; the first one every cell fits wins
const CANDIDATES: [(CellType, CellParser); 5] = [
    (CellType::Int, parse_int),
    (CellType::Float, parse_float),
    (CellType::Bool, parse_bool),
    (CellType::Date, parse_date),
    (CellType::DateTime, parse_datetime),
];

/// Parser for CSV and TSV files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table> {
        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
        let delimiter = options.delimiter.unwrap_or(if is_tsv { b'\t' } else { b',' });

        let reader = BufReader::new(super::open(path)?);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .clone();

        let mut records: Vec<(usize, StringRecord)> = Vec::new();
        for (record_idx, result) in csv_reader.records().enumerate() {
            // header is line 1
            let line = record_idx + 2;
            let record = result.with_context(|| format!("Failed to read CSV row {}", line))?;
            records.push((line, record));
        }

        let typing: Vec<(CellType, Option<CellParser>)> = (0..headers.len())
            .map(|col| infer_column(records.iter().filter_map(move |(_, r)| r.get(col))))
            .collect();

        let columns = headers
            .iter()
            .zip(&typing)
            .enumerate()
            .map(|(i, (name, (cell_type, _)))| Column::with_type(name.trim(), i, *cell_type))
            .collect();
        let mut table = Table::new(columns);

        for (line, record) in &records {
            let cells = record
                .iter()
                .zip(&typing)
                .map(|(raw, (_, parser))| typed_value(raw, *parser))
                .collect();
            table.add_row(cells, *line);
        }

        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }

    fn preserves_text(&self) -> bool {
        true
    }
}

/// Pick the column type from its raw cells
///
/// Returns `Null` for a column with no non-empty cell and `String` with no
/// parser when no candidate reproduces every cell.
fn infer_column<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> (CellType, Option<CellParser>) {
    let mut present = cells.filter(|s| !s.is_empty()).peekable();
    if present.peek().is_none() {
        return (CellType::Null, None);
    }

    CANDIDATES
        .iter()
        .find(|(_, parser)| present.clone().all(|raw| round_trips(raw, *parser).is_some()))
        .map_or((CellType::String, None), |&(cell_type, parser)| (cell_type, Some(parser)))
}

fn typed_value(raw: &str, parser: Option<CellParser>) -> CellValue {
    if raw.is_empty() {
        return CellValue::Null;
    }
    parser
        .and_then(|p| round_trips(raw, p))
        .unwrap_or_else(|| CellValue::from(raw.to_string()))
}

/// Parse a cell, keeping the value only if it displays as the original text
fn round_trips(raw: &str, parser: CellParser) -> Option<CellValue> {
    parser(raw).filter(|value| value.display() == raw)
}

fn parse_int(s: &str) -> Option<CellValue> {
    s.parse().ok().map(CellValue::Int)
}

fn parse_float(s: &str) -> Option<CellValue> {
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(CellValue::Float)
}

fn parse_bool(s: &str) -> Option<CellValue> {
    s.parse().ok().map(CellValue::Bool)
}

fn parse_date(s: &str) -> Option<CellValue> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(CellValue::Date)
}

fn parse_datetime(s: &str) -> Option<CellValue> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(CellValue::DateTime)
}
