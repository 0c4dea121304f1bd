//! A header-plus-rows string table, the common shape of spreadsheet exports
//! and the live response sheet.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use feedpulse_core::schema::missing_columns;

use crate::StoreError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Short rows are padded with empty cells to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Build from string-typed batches. Null cells become empty strings.
    pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Self {
        let headers: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        let mut rows = Vec::new();
        for batch in batches {
            for row in 0..batch.num_rows() {
                rows.push(
                    batch
                        .columns()
                        .iter()
                        .map(|col| get_string(col.as_ref(), row).unwrap_or_default())
                        .collect(),
                );
            }
        }
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Required column names absent from the header.
    pub fn missing(&self, required: &[&str]) -> Vec<String> {
        missing_columns(self.headers.iter().map(String::as_str), required)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Read a headed CSV file with every column typed as nullable `Utf8`.
///
/// Cell interpretation is left to the caller so that a malformed cell can be
/// reported by row rather than failing schema inference. Rows with fewer
/// fields than the header get nulls for the missing trailing cells.
pub(crate) fn read_csv_batches(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), StoreError> {
    let mut file = File::open(path)?;
    let (inferred, _) = Format::default()
        .with_header(true)
        .with_truncated_rows(true)
        .infer_schema(&mut file, None)?;
    let schema: SchemaRef = Arc::new(Schema::new(
        inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    if schema.fields().is_empty() {
        return Ok((schema, vec![]));
    }

    file.rewind()?;
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_truncated_rows(true)
        .build(file)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}

/// Read a headed CSV export into a [`Table`].
pub fn read_csv_table(path: &Path) -> Result<Table, StoreError> {
    let (schema, batches) = read_csv_batches(path)?;
    Ok(Table::from_batches(&schema, &batches))
}

/// Extract a string value from a Utf8 or LargeUtf8 column.
pub(crate) fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn short_rows_are_padded() {
        let table = Table::new(
            headers(&["Timestamp", "Question 11", "REMARKS"]),
            vec![vec!["1/2/2024 10:00:00".into()]],
        );
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.cell(0, 2), "");
        assert_eq!(table.cell(5, 0), "");
    }

    #[test]
    fn missing_columns_by_name() {
        let table = Table::new(headers(&["Timestamp", "REMARKS"]), vec![]);
        assert_eq!(
            table.missing(&["Timestamp", "Question 11", "REMARKS"]),
            vec!["Question 11".to_string()]
        );
        assert_eq!(table.column_index("REMARKS"), Some(1));
        assert!(table.is_empty());
    }

    #[test]
    fn reads_csv_as_strings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Timestamp,Question 11,REMARKS,score").unwrap();
        writeln!(file, "2024-03-01 09:00:00,More labs,,0.5").unwrap();
        writeln!(file, "2024-03-01 09:05:00,\"Slow wifi, again\",nil,1").unwrap();
        file.flush().unwrap();

        let table = read_csv_table(file.path()).unwrap();
        assert_eq!(table.headers().len(), 4);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 2), "");
        assert_eq!(table.cell(1, 1), "Slow wifi, again");
        assert_eq!(table.cell(0, 3), "0.5");
    }

    #[test]
    fn short_csv_rows_get_blank_trailing_cells() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Timestamp,Question 11,REMARKS,session_name,extra").unwrap();
        writeln!(file, "2024-03-01 09:00:00,labs,good,RUST-101,x").unwrap();
        writeln!(file, "2024-03-01 09:05:00,pace,ok,RUST-101").unwrap();
        writeln!(file, "2024-03-01 09:10:00").unwrap();
        file.flush().unwrap();

        let table = read_csv_table(file.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(1, 3), "RUST-101");
        assert_eq!(table.cell(1, 4), "");
        assert_eq!(table.cell(2, 1), "");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_csv_table(Path::new("/nonexistent/responses.csv")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
