//! Parquet file parser

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType as ArrowType, Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::{DateTime, NaiveDate};
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::ReadOptions;
use crate::model::{CellType, CellValue, Column, Table};

use super::Parser;

/// Parser for Parquet files
pub struct ParquetParser;

impl Parser for ParquetParser {
    fn parse(&self, path: &Path, _options: &ReadOptions) -> Result<Table> {
        let file = super::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("Failed to read Parquet metadata: {}", path.display()))?;

        let columns: Vec<Column> = builder
            .schema()
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| Column::with_type(field.name().as_str(), i, cell_type(field.data_type())))
            .collect();
        let mut table = Table::new(columns);

        let reader = builder.build().context("Failed to build Parquet reader")?;
        let mut line = 0usize;
        for batch in reader {
            let batch = batch.context("Failed to read Parquet batch")?;
            for row_idx in 0..batch.num_rows() {
                line += 1;
                let cells = batch
                    .columns()
                    .iter()
                    .map(|col| cell_value(col, row_idx))
                    .collect::<Result<Vec<_>>>()?;
                table.add_row(cells, line);
            }
        }

        text_for_unrepresentable(&mut table);
        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "parquet" | "pq")
    }
}

/// Read a column as text when some value does not fit its declared type,
/// such as a `UInt64` above `i64::MAX` or a date outside the chrono range
fn text_for_unrepresentable(table: &mut Table) {
    for col_idx in 0..table.columns.len() {
        let declared = table.columns[col_idx].inferred_type;
        let fits = table
            .rows
            .iter()
            .filter_map(|row| row.get(col_idx))
            .all(|cell| cell.is_null() || cell.cell_type() == declared);
        if !fits {
            debug!(
                "reading Parquet column '{}' as text: values do not fit {}",
                table.columns[col_idx].name, declared
            );
            super::as_text(table, col_idx);
        }
    }
}

fn cell_type(arrow_type: &ArrowType) -> CellType {
    match arrow_type {
        ArrowType::Null => CellType::Null,
        ArrowType::Boolean => CellType::Bool,
        t if t.is_integer() => CellType::Int,
        t if t.is_floating() => CellType::Float,
        ArrowType::Date32 | ArrowType::Date64 => CellType::Date,
        ArrowType::Timestamp(_, _) => CellType::DateTime,
        ArrowType::List(_) | ArrowType::LargeList(_) => CellType::List,
        _ => CellType::String,
    }
}

fn cell_value(array: &ArrayRef, row_idx: usize) -> Result<CellValue> {
    if array.is_null(row_idx) {
        return Ok(CellValue::Null);
    }

    let value = match array.data_type() {
        ArrowType::Boolean => CellValue::Bool(array.as_boolean().value(row_idx)),
        ArrowType::Int8 => CellValue::Int(array.as_primitive::<Int8Type>().value(row_idx) as i64),
        ArrowType::Int16 => CellValue::Int(array.as_primitive::<Int16Type>().value(row_idx) as i64),
        ArrowType::Int32 => CellValue::Int(array.as_primitive::<Int32Type>().value(row_idx) as i64),
        ArrowType::Int64 => CellValue::Int(array.as_primitive::<Int64Type>().value(row_idx)),
        ArrowType::UInt8 => CellValue::Int(array.as_primitive::<UInt8Type>().value(row_idx) as i64),
        ArrowType::UInt16 => CellValue::Int(array.as_primitive::<UInt16Type>().value(row_idx) as i64),
        ArrowType::UInt32 => CellValue::Int(array.as_primitive::<UInt32Type>().value(row_idx) as i64),
        ArrowType::UInt64 => {
            let v = array.as_primitive::<UInt64Type>().value(row_idx);
            i64::try_from(v)
                .map(CellValue::Int)
                .unwrap_or_else(|_| CellValue::String(Cow::Owned(v.to_string())))
        }
        ArrowType::Float32 => CellValue::Float(array.as_primitive::<Float32Type>().value(row_idx) as f64),
        ArrowType::Float64 => CellValue::Float(array.as_primitive::<Float64Type>().value(row_idx)),
        ArrowType::Utf8 => CellValue::String(Cow::Owned(array.as_string::<i32>().value(row_idx).to_string())),
        ArrowType::LargeUtf8 => {
            CellValue::String(Cow::Owned(array.as_string::<i64>().value(row_idx).to_string()))
        }
        ArrowType::Date32 => {
            let days = array.as_primitive::<Date32Type>().value(row_idx);
            days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
                .and_then(NaiveDate::from_num_days_from_ce_opt)
                .map_or_else(|| CellValue::from(days.to_string()), CellValue::Date)
        }
        ArrowType::Date64 => {
            let millis = array.as_primitive::<Date64Type>().value(row_idx);
            DateTime::from_timestamp_millis(millis)
                .map_or_else(|| CellValue::from(millis.to_string()), |dt| CellValue::Date(dt.date_naive()))
        }
        ArrowType::Timestamp(unit, _) => {
            let (value, nanos_per_unit) = match unit {
                TimeUnit::Second => (array.as_primitive::<TimestampSecondType>().value(row_idx), 1_000_000_000),
                TimeUnit::Millisecond => {
                    (array.as_primitive::<TimestampMillisecondType>().value(row_idx), 1_000_000)
                }
                TimeUnit::Microsecond => {
                    (array.as_primitive::<TimestampMicrosecondType>().value(row_idx), 1_000)
                }
                TimeUnit::Nanosecond => (array.as_primitive::<TimestampNanosecondType>().value(row_idx), 1),
            };
            value
                .checked_mul(nanos_per_unit)
                .map_or_else(
                    || CellValue::from(value.to_string()),
                    |nanos| CellValue::DateTime(DateTime::from_timestamp_nanos(nanos).naive_utc()),
                )
        }
        ArrowType::List(_) => {
            let items = array.as_list::<i32>().value(row_idx);
            CellValue::List(
                (0..items.len())
                    .map(|i| cell_value(&items, i))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        _ => {
            let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())
                .with_context(|| format!("Unsupported Parquet column type {}", array.data_type()))?;
            CellValue::String(Cow::Owned(formatter.value(row_idx).to_string()))
        }
    };

    Ok(value)
}

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Date64Array, Int64Array, ListArray, StringArray, UInt64Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    #[test]
    fn test_cell_types() {
        assert_eq!(cell_type(&ArrowType::UInt16), CellType::Int);
        assert_eq!(cell_type(&ArrowType::Float32), CellType::Float);
        assert_eq!(cell_type(&ArrowType::Utf8), CellType::String);
        assert_eq!(cell_type(&ArrowType::Date64), CellType::Date);
    }

    #[test]
    fn test_list_values() {
        let list: ArrayRef = Arc::new(ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
            Some(vec![Some(1), None]),
            None,
        ]));
        assert_eq!(
            cell_value(&list, 0).unwrap(),
            CellValue::List(vec![CellValue::Int(1), CellValue::Null])
        );
        assert_eq!(cell_value(&list, 1).unwrap(), CellValue::Null);
    }

    #[test]
    fn test_date64_values_are_dates() {
        let millis_per_day = 86_400_000;
        let dates: ArrayRef = Arc::new(Date64Array::from(vec![Some(millis_per_day), None]));
        assert_eq!(
            cell_value(&dates, 0).unwrap(),
            CellValue::Date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap())
        );
        assert_eq!(cell_value(&dates, 1).unwrap(), CellValue::Null);
    }

    fn write_parquet(path: &Path, batch: &RecordBatch) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_large_unsigned_column_is_read_as_text() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("small", ArrowType::UInt64, false),
            Field::new("big", ArrowType::UInt64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(UInt64Array::from(vec![1, 2])),
                Arc::new(UInt64Array::from(vec![Some(1), Some(u64::MAX)])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsigned.parquet");
        write_parquet(&path, &batch);

        let table = ParquetParser.parse(&path, &ReadOptions::default()).unwrap();
        assert_eq!(table.columns[0].inferred_type, CellType::Int);
        assert_eq!(table.columns[1].inferred_type, CellType::String);
        assert_eq!(table.cell(0, "big"), Some(&CellValue::from("1")));
        assert_eq!(table.cell(1, "big"), Some(&CellValue::from(u64::MAX.to_string())));
    }

    #[test]
    fn test_parse_file() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", ArrowType::Int64, false),
            Field::new("name", ArrowType::Utf8, true),
            Field::new("born", ArrowType::Date32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("a"), None])),
                Arc::new(Date32Array::from(vec![Some(0), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        write_parquet(&path, &batch);

        let table = ParquetParser.parse(&path, &ReadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["id", "name", "born"]);
        assert_eq!(table.columns[2].inferred_type, CellType::Date);
        assert_eq!(table.cell(1, "id"), Some(&CellValue::Int(2)));
        assert_eq!(table.cell(1, "name"), Some(&CellValue::Null));
        assert_eq!(
            table.cell(0, "born"),
            Some(&CellValue::Date(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()))
        );
    }
}
