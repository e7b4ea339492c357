//! JSON parser for arrays of objects and JSON Lines

use std::borrow::Cow;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::config::ReadOptions;
use crate::model::{CellValue, Column, Table};

use super::csv::DATETIME_FORMATS;
use super::Parser;

/// Parser for JSON files
///
/// Accepts a top-level array of objects, a single object, or a stream of
/// objects (JSON Lines). Columns are the union of all keys in first-seen
/// order; missing keys become nulls.
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, path: &Path, _options: &ReadOptions) -> Result<Table> {
        let reader = BufReader::new(super::open(path)?);

        let mut objects: Vec<Map<String, Value>> = Vec::new();
        for (idx, value) in serde_json::Deserializer::from_reader(reader)
            .into_iter::<Value>()
            .enumerate()
        {
            let value = value
                .with_context(|| format!("Failed to parse JSON value {} in {}", idx + 1, path.display()))?;
            match value {
                Value::Array(items) => {
                    for item in items {
                        objects.push(into_object(item, objects.len() + 1)?);
                    }
                }
                other => objects.push(into_object(other, objects.len() + 1)?),
            }
        }

        let mut column_names: IndexSet<&str> = IndexSet::new();
        for obj in &objects {
            column_names.extend(obj.keys().map(String::as_str));
        }

        let columns: Vec<Column> = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(*name, i))
            .collect();
        let mut table = Table::new(columns);

        for (idx, obj) in objects.iter().enumerate() {
            let cells = column_names
                .iter()
                .map(|key| json_value_to_cell(obj.get(*key)))
                .collect();
            table.add_row(cells, idx + 1);
        }

        table.infer_column_types();
        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "json" | "jsonl" | "ndjson")
    }
}

fn into_object(value: Value, row: usize) -> Result<Map<String, Value>> {
    match value {
        Value::Object(obj) => Ok(obj),
        other => bail!("JSON row {} is not an object: {}", row, other),
    }
}

fn json_value_to_cell(value: Option<&Value>) -> CellValue {
    match value {
        None | Some(Value::Null) => CellValue::Null,
        Some(Value::Bool(b)) => CellValue::Bool(*b),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(Cow::Owned(n.to_string()))
            }
        }
        Some(Value::String(s)) => {
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return CellValue::Date(date);
            }
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::String(Cow::Owned(s.clone())))
        }
        Some(Value::Array(items)) => {
            CellValue::List(items.iter().map(|item| json_value_to_cell(Some(item))).collect())
        }
        // nested objects are kept as their JSON text
        Some(Value::Object(obj)) => CellValue::String(Cow::Owned(Value::Object(obj.clone()).to_string())),
    }
}
