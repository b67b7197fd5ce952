//! JSON row source.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Nested fields are supported using dot paths in schema field names (e.g. `user.name`).
//! The whole input is loaded into a [`DataSet`] and served through a [`DataSetCursor`].

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;

use crate::error::{ProjectionError, ProjectionResult};
use crate::types::{DataSet, DataType, Schema, Value};

use super::{DataSetCursor, parse_text};

/// Load a JSON file into a cursor.
pub fn json_cursor_from_path(path: impl AsRef<Path>, schema: &Schema) -> ProjectionResult<DataSetCursor> {
    let text = fs::read_to_string(path)?;
    json_cursor_from_str(&text, schema)
}

/// Load JSON text into a cursor.
pub fn json_cursor_from_str(input: &str, schema: &Schema) -> ProjectionResult<DataSetCursor> {
    dataset_from_json_str(input, schema).map(DataSetCursor::new)
}

/// Parse JSON text into a [`DataSet`] typed by `schema`.
pub fn dataset_from_json_str(input: &str, schema: &Schema) -> ProjectionResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ProjectionError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => dataset_from_json_values(&items, schema),
            serde_json::Value::Object(_) => dataset_from_json_values(std::slice::from_ref(&v), schema),
            _ => Err(ProjectionError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
                ProjectionError::SchemaMismatch {
                    message: format!("invalid ndjson at line {}: {}", i + 1, e),
                }
            })?;
            values.push(v);
        }
        dataset_from_json_values(&values, schema)
    }
}

fn dataset_from_json_values(values: &[serde_json::Value], schema: &Schema) -> ProjectionResult<DataSet> {
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let row_num = idx0 + 1;
        let obj = v.as_object().ok_or_else(|| ProjectionError::SchemaMismatch {
            message: format!("row {row_num} is not a json object"),
        })?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            // Absent keys read as null, like a column the producing query left empty.
            let cell = match get_by_dot_path(obj, &field.name) {
                Some(jv) => convert_json_value(row_num, &field.name, field.data_type, jv)?,
                None => Value::Null,
            };
            row.push(cell);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

fn get_by_dot_path<'a>(
    root: &'a serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Option<&'a serde_json::Value> {
    let mut segments = path.split('.');
    let mut current: &serde_json::Value = root.get(segments.next().unwrap_or(path))?;

    for segment in segments {
        match current {
            serde_json::Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn convert_json_value(
    row: usize,
    column: &str,
    data_type: DataType,
    v: &serde_json::Value,
) -> ProjectionResult<Value> {
    let parse_error = |message: String| ProjectionError::ParseError {
        row,
        column: column.to_string(),
        raw: v.to_string(),
        message,
    };

    if v.is_null() {
        return Ok(Value::Null);
    }

    // Text cells go through the same parser as CSV (dates, ids, decimals...).
    if let Some(text) = v.as_str() {
        if data_type == DataType::Utf8 {
            return Ok(Value::Utf8(text.to_string()));
        }
        return parse_text(data_type, text.trim()).map_err(parse_error);
    }

    match data_type {
        DataType::Bool => v
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| parse_error("expected bool".to_string())),
        DataType::Int8 => json_integer(v).map(Value::Int8).map_err(parse_error),
        DataType::UInt8 => json_integer(v).map(Value::UInt8).map_err(parse_error),
        DataType::Int16 => json_integer(v).map(Value::Int16).map_err(parse_error),
        DataType::UInt16 => json_integer(v).map(Value::UInt16).map_err(parse_error),
        DataType::Int32 => json_integer(v).map(Value::Int32).map_err(parse_error),
        DataType::UInt32 => json_integer(v).map(Value::UInt32).map_err(parse_error),
        DataType::Int64 => json_integer(v).map(Value::Int64).map_err(parse_error),
        DataType::UInt64 => json_integer(v).map(Value::UInt64).map_err(parse_error),
        DataType::Float32 => v
            .as_f64()
            .map(|f| Value::Float32(f as f32))
            .ok_or_else(|| parse_error("expected number".to_string())),
        DataType::Float64 => v
            .as_f64()
            .map(Value::Float64)
            .ok_or_else(|| parse_error("expected number".to_string())),
        DataType::Decimal => match v {
            serde_json::Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str_exact(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(Value::Decimal)
                    .map_err(|e| parse_error(e.to_string()))
            }
            _ => Err(parse_error("expected number or numeric string".to_string())),
        },
        DataType::Binary => match v {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Value::Binary)
                .ok_or_else(|| parse_error("expected array of byte values".to_string())),
            _ => Err(parse_error("expected array of byte values".to_string())),
        },
        DataType::Utf8 => Err(parse_error("expected string".to_string())),
        DataType::DateTime | DataType::Uuid => Err(parse_error("expected string".to_string())),
    }
}

fn json_integer<I: TryFrom<i64> + TryFrom<u64>>(v: &serde_json::Value) -> Result<I, String> {
    if let Some(n) = v.as_i64() {
        <I as TryFrom<i64>>::try_from(n).map_err(|_| format!("{n} out of range"))
    } else if let Some(n) = v.as_u64() {
        <I as TryFrom<u64>>::try_from(n).map_err(|_| format!("{n} out of range"))
    } else {
        Err("expected integer number".to_string())
    }
}
