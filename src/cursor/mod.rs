//! The row cursor contract and the built-in cursor sources.
//!
//! A [`RowCursor`] is a forward-only, read-once handle over a tabular result: one row is
//! materialized at a time and cells are addressed by zero-based ordinal. Database access layers
//! implement the trait for their own result types; this module also ships in-memory, CSV and
//! JSON sources:
//!
//! - [`DataSetCursor`]: rows held in a [`crate::types::DataSet`]
//! - [`CsvCursor`]: streams a `csv::Reader`, parsing each record against a [`Schema`]
//! - [`json`]: loads a JSON array or NDJSON into a [`DataSetCursor`]
//!
//! [`open_path`] picks the source from a file extension.

pub mod csv;
pub mod dataset;
pub mod json;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ProjectionError, ProjectionResult};
use crate::types::{DataType, Schema, Value};

pub use self::csv::CsvCursor;
pub use dataset::DataSetCursor;

macro_rules! exact_getter {
    ($(#[$meta:meta])* $name:ident -> $ty:ty, $variant:ident, $label:literal) => {
        $(#[$meta])*
        fn $name(&self, ordinal: usize) -> ProjectionResult<$ty> {
            match self.get_value(ordinal)? {
                Value::$variant(v) => Ok(v),
                other => Err(ProjectionError::ColumnTypeMismatch {
                    ordinal,
                    expected: $label,
                    found: other.type_name(),
                }),
            }
        }
    };
}

/// Sequential, read-once access to a tabular result.
///
/// Only [`field_count`](Self::field_count), [`advance`](Self::advance),
/// [`column_name`](Self::column_name) and [`get_value`](Self::get_value) are required. The typed
/// getters default to an exact-shape match over `get_value`; sources with cheaper native access
/// should override them.
///
/// Cursors are not safe for concurrent reads: exactly one consumer drives a cursor.
pub trait RowCursor {
    /// Number of columns in the current result.
    fn field_count(&self) -> usize;

    /// Moves to the next row. Returns `false` once the result is exhausted.
    fn advance(&mut self) -> ProjectionResult<bool>;

    /// Column name reported for `ordinal`.
    fn column_name(&self, ordinal: usize) -> ProjectionResult<&str>;

    /// The cell at `ordinal` in the current row, as an opaque value.
    fn get_value(&self, ordinal: usize) -> ProjectionResult<Value>;

    /// Whether the cell at `ordinal` in the current row is null.
    fn is_null(&self, ordinal: usize) -> ProjectionResult<bool> {
        Ok(self.get_value(ordinal)?.is_null())
    }

    /// A closed cursor is rejected by every projection entry point.
    fn is_closed(&self) -> bool {
        false
    }

    exact_getter!(get_bool -> bool, Bool, "bool");
    exact_getter!(get_u8 -> u8, UInt8, "uint8");
    exact_getter!(get_i16 -> i16, Int16, "int16");
    exact_getter!(get_i32 -> i32, Int32, "int32");
    exact_getter!(get_i64 -> i64, Int64, "int64");
    exact_getter!(get_f32 -> f32, Float32, "float32");
    exact_getter!(get_f64 -> f64, Float64, "float64");
    exact_getter!(get_decimal -> Decimal, Decimal, "decimal");
    exact_getter!(get_datetime -> NaiveDateTime, DateTime, "datetime");
    exact_getter!(get_uuid -> Uuid, Uuid, "uuid");
    exact_getter!(get_string -> String, Utf8, "utf8");

    /// Copies bytes of a binary cell starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes copied; `0` means the end of the cell was reached.
    fn get_bytes(&self, ordinal: usize, offset: usize, buf: &mut [u8]) -> ProjectionResult<usize> {
        match self.get_value(ordinal)? {
            Value::Binary(bytes) => Ok(copy_chunk(&bytes, offset, buf)),
            other => Err(ProjectionError::ColumnTypeMismatch {
                ordinal,
                expected: "binary",
                found: other.type_name(),
            }),
        }
    }

    /// Copies characters of a text cell starting at character `offset` into `buf`.
    ///
    /// Returns the number of characters copied; `0` means the end of the cell was reached.
    fn get_chars(&self, ordinal: usize, offset: usize, buf: &mut [char]) -> ProjectionResult<usize> {
        match self.get_value(ordinal)? {
            Value::Utf8(text) => Ok(copy_char_chunk(&text, offset, buf)),
            other => Err(ProjectionError::ColumnTypeMismatch {
                ordinal,
                expected: "utf8",
                found: other.type_name(),
            }),
        }
    }
}

pub(crate) fn copy_chunk(src: &[u8], offset: usize, buf: &mut [u8]) -> usize {
    if offset >= src.len() {
        return 0;
    }
    let n = buf.len().min(src.len() - offset);
    buf[..n].copy_from_slice(&src[offset..offset + n]);
    n
}

/// Copies characters of `text` starting at character `offset` into `buf`.
pub(crate) fn copy_char_chunk(text: &str, offset: usize, buf: &mut [char]) -> usize {
    let bytes = text.as_bytes();
    // Over an ASCII prefix character and byte offsets agree.
    let rest = if bytes.len() >= offset && bytes[..offset].is_ascii() {
        &text[offset..]
    } else {
        match text.char_indices().nth(offset) {
            Some((start, _)) => &text[start..],
            None => "",
        }
    };
    let mut copied = 0;
    for (slot, ch) in buf.iter_mut().zip(rest.chars()) {
        *slot = ch;
        copied += 1;
    }
    copied
}

/// Supported file-backed cursor sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
}

impl CursorFormat {
    /// Parse a cursor format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options for [`open_path`].
#[derive(Debug, Clone, Default)]
pub struct CursorOptions {
    /// If `None`, infer the format from the file extension.
    pub format: Option<CursorFormat>,
}

/// Open a file as a row cursor typed by `schema`.
pub fn open_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &CursorOptions,
) -> ProjectionResult<Box<dyn RowCursor>> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    Ok(match format {
        CursorFormat::Csv => Box::new(CsvCursor::from_path(path, schema.clone())?),
        CursorFormat::Json => Box::new(json::json_cursor_from_path(path, schema)?),
    })
}

fn infer_format_from_path(path: &Path) -> ProjectionResult<CursorFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ProjectionError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    CursorFormat::from_extension(ext).ok_or_else(|| ProjectionError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

/// Parse trimmed, non-empty text into a [`Value`] of `data_type`.
///
/// Shared by the CSV and JSON sources for cells that arrive as text.
pub(crate) fn parse_text(data_type: DataType, text: &str) -> Result<Value, String> {
    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(text.to_owned())),
        DataType::Binary => Ok(Value::Binary(text.as_bytes().to_vec())),
        DataType::Bool => parse_bool(text).map(Value::Bool),
        DataType::Int8 => parse_num(text).map(Value::Int8),
        DataType::UInt8 => parse_num(text).map(Value::UInt8),
        DataType::Int16 => parse_num(text).map(Value::Int16),
        DataType::UInt16 => parse_num(text).map(Value::UInt16),
        DataType::Int32 => parse_num(text).map(Value::Int32),
        DataType::UInt32 => parse_num(text).map(Value::UInt32),
        DataType::Int64 => parse_num(text).map(Value::Int64),
        DataType::UInt64 => parse_num(text).map(Value::UInt64),
        DataType::Float32 => parse_num(text).map(Value::Float32),
        DataType::Float64 => parse_num(text).map(Value::Float64),
        DataType::Decimal => Decimal::from_str_exact(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map(Value::Decimal)
            .map_err(|e| e.to_string()),
        DataType::DateTime => parse_datetime(text).map(Value::DateTime),
        DataType::Uuid => Uuid::parse_str(text).map(Value::Uuid).map_err(|e| e.to_string()),
    }
}

fn parse_num<N>(text: &str) -> Result<N, String>
where
    N: FromStr,
    N::Err: fmt::Display,
{
    text.parse::<N>().map_err(|e| e.to_string())
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| "expected datetime (YYYY-MM-DD[ HH:MM:SS[.f]])".to_string())
}
