//! Streaming CSV cursor.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ProjectionError, ProjectionResult};
use crate::types::{Schema, Value};

use super::{RowCursor, copy_char_chunk, copy_chunk, parse_text};

/// A [`RowCursor`] that reads one CSV record per [`advance`](RowCursor::advance).
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all schema fields (order can differ); extra CSV columns are ignored.
/// - Columns are reported in schema order under their schema names.
/// - Empty (or whitespace-only) cells are null.
pub struct CsvCursor<R> {
    reader: ::csv::Reader<R>,
    schema: Schema,
    col_idxs: Vec<usize>,
    record: ::csv::StringRecord,
    current: Option<Vec<Value>>,
    // 1-based data row number of `current`; the header is not counted.
    row: usize,
}

impl CsvCursor<File> {
    /// Open a CSV file with headers.
    pub fn from_path(path: impl AsRef<Path>, schema: Schema) -> ProjectionResult<Self> {
        let rdr = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;
        Self::from_reader(rdr, schema)
    }
}

impl<R: Read> CsvCursor<R> {
    /// Wrap an existing CSV reader (which must be configured with headers).
    pub fn from_reader(mut reader: ::csv::Reader<R>, schema: Schema) -> ProjectionResult<Self> {
        let headers = reader.headers()?.clone();

        // Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
        let mut col_idxs = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            match headers.iter().position(|h| h == field.name) {
                Some(idx) => col_idxs.push(idx),
                None => {
                    return Err(ProjectionError::SchemaMismatch {
                        message: format!(
                            "missing required column '{field}'. headers={:?}",
                            headers.iter().collect::<Vec<_>>(),
                            field = field.name
                        ),
                    });
                }
            }
        }

        Ok(Self {
            reader,
            schema,
            col_idxs,
            record: ::csv::StringRecord::new(),
            current: None,
            row: 0,
        })
    }

    fn cell(&self, ordinal: usize) -> ProjectionResult<&Value> {
        let row = self.current.as_ref().ok_or_else(|| ProjectionError::InvalidCursor {
            message: "no current row".to_string(),
        })?;
        row.get(ordinal).ok_or(ProjectionError::OrdinalOutOfRange {
            ordinal,
            field_count: row.len(),
        })
    }

    fn parse_record(&self) -> ProjectionResult<Vec<Value>> {
        let mut row = Vec::with_capacity(self.schema.fields.len());
        for (field, &csv_idx) in self.schema.fields.iter().zip(self.col_idxs.iter()) {
            let raw = self.record.get(csv_idx).unwrap_or("");
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                row.push(Value::Null);
                continue;
            }
            let value = parse_text(field.data_type, trimmed).map_err(|message| {
                ProjectionError::ParseError {
                    row: self.row,
                    column: field.name.clone(),
                    raw: raw.to_owned(),
                    message,
                }
            })?;
            row.push(value);
        }
        Ok(row)
    }
}

impl<R: Read> RowCursor for CsvCursor<R> {
    fn field_count(&self) -> usize {
        self.schema.fields.len()
    }

    fn advance(&mut self) -> ProjectionResult<bool> {
        // A failed read or parse leaves no current row.
        self.current = None;
        if !self.reader.read_record(&mut self.record)? {
            return Ok(false);
        }
        self.row += 1;
        self.current = Some(self.parse_record()?);
        Ok(true)
    }

    fn column_name(&self, ordinal: usize) -> ProjectionResult<&str> {
        self.schema
            .fields
            .get(ordinal)
            .map(|f| f.name.as_str())
            .ok_or(ProjectionError::OrdinalOutOfRange {
                ordinal,
                field_count: self.field_count(),
            })
    }

    fn get_value(&self, ordinal: usize) -> ProjectionResult<Value> {
        self.cell(ordinal).cloned()
    }

    fn is_null(&self, ordinal: usize) -> ProjectionResult<bool> {
        Ok(self.cell(ordinal)?.is_null())
    }

    fn get_bytes(&self, ordinal: usize, offset: usize, buf: &mut [u8]) -> ProjectionResult<usize> {
        match self.cell(ordinal)? {
            Value::Binary(bytes) => Ok(copy_chunk(bytes, offset, buf)),
            other => Err(ProjectionError::ColumnTypeMismatch {
                ordinal,
                expected: "binary",
                found: other.type_name(),
            }),
        }
    }

    fn get_chars(&self, ordinal: usize, offset: usize, buf: &mut [char]) -> ProjectionResult<usize> {
        match self.cell(ordinal)? {
            Value::Utf8(text) => Ok(copy_char_chunk(text, offset, buf)),
            other => Err(ProjectionError::ColumnTypeMismatch {
                ordinal,
                expected: "utf8",
                found: other.type_name(),
            }),
        }
    }
}
