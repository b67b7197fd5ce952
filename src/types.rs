//! Core data model types shared by cursors and projectors.
//!
//! Cursor sources describe their columns with a [`Schema`] (a list of typed [`Field`]s) and hand
//! out cells as opaque [`Value`]s. [`DataSet`] is the in-memory table behind
//! [`crate::cursor::DataSetCursor`].

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProjectionResult;

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Boolean.
    Bool,
    /// 8-bit signed integer.
    Int8,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit signed integer.
    Int16,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit signed integer.
    Int32,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit floating point number.
    Float32,
    /// 64-bit floating point number.
    Float64,
    /// Fixed-point decimal.
    Decimal,
    /// Date and time without a time zone.
    DateTime,
    /// 128-bit identifier.
    Uuid,
    /// UTF-8 string.
    Utf8,
    /// Opaque bytes.
    Binary,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the column layout of a cursor source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Load a schema from its JSON form, e.g.
    /// `{"fields":[{"name":"id","data_type":"int32"}]}`.
    pub fn from_json_str(input: &str) -> ProjectionResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a schema from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> ProjectionResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single cell value as handed out by a [`crate::cursor::RowCursor`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 8-bit signed integer value.
    Int8(i8),
    /// 8-bit unsigned integer value.
    UInt8(u8),
    /// 16-bit signed integer value.
    Int16(i16),
    /// 16-bit unsigned integer value.
    UInt16(u16),
    /// 32-bit signed integer value.
    Int32(i32),
    /// 32-bit unsigned integer value.
    UInt32(u32),
    /// 64-bit signed integer value.
    Int64(i64),
    /// 64-bit unsigned integer value.
    UInt64(u64),
    /// 32-bit floating point value.
    Float32(f32),
    /// 64-bit floating point value.
    Float64(f64),
    /// Fixed-point decimal value.
    Decimal(Decimal),
    /// Date and time without a time zone.
    DateTime(NaiveDateTime),
    /// 128-bit identifier value.
    Uuid(Uuid),
    /// UTF-8 string value.
    Utf8(String),
    /// Opaque bytes.
    Binary(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short shape name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::UInt8(_) => "uint8",
            Value::Int16(_) => "int16",
            Value::UInt16(_) => "uint16",
            Value::Int32(_) => "int32",
            Value::UInt32(_) => "uint32",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Decimal(_) => "decimal",
            Value::DateTime(_) => "datetime",
            Value::Uuid(_) => "uuid",
            Value::Utf8(_) => "utf8",
            Value::Binary(_) => "binary",
        }
    }

    /// Render the value as JSON.
    ///
    /// Decimals, date-times and identifiers become strings so no precision is lost; binary becomes
    /// an array of byte values; non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(v) => Json::Bool(*v),
            Value::Int8(v) => Json::from(*v),
            Value::UInt8(v) => Json::from(*v),
            Value::Int16(v) => Json::from(*v),
            Value::UInt16(v) => Json::from(*v),
            Value::Int32(v) => Json::from(*v),
            Value::UInt32(v) => Json::from(*v),
            Value::Int64(v) => Json::from(*v),
            Value::UInt64(v) => Json::from(*v),
            Value::Float32(v) => serde_json::Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number),
            Value::Float64(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Value::Decimal(v) => Json::String(v.to_string()),
            Value::DateTime(v) => Json::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Uuid(v) => Json::String(v.hyphenated().to_string()),
            Value::Utf8(v) => Json::String(v.clone()),
            Value::Binary(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Utf8(v) => f.write_str(v),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{DataType, Field, Schema, Value};

    #[test]
    fn schema_loads_from_json() {
        let schema = Schema::from_json_str(
            r#"{"fields":[{"name":"id","data_type":"int32"},{"name":"amount","data_type":"decimal"}]}"#,
        )
        .unwrap();
        assert_eq!(
            schema,
            Schema::new(vec![
                Field::new("id", DataType::Int32),
                Field::new("amount", DataType::Decimal),
            ])
        );
        assert_eq!(schema.index_of("amount"), Some(1));
    }

    #[test]
    fn schema_rejects_unknown_type() {
        let err = Schema::from_json_str(r#"{"fields":[{"name":"id","data_type":"money"}]}"#).unwrap_err();
        assert!(err.to_string().contains("json error"));
    }

    #[test]
    fn value_renders_json_without_losing_precision() {
        let d = rust_decimal::Decimal::new(12345, 2);
        assert_eq!(Value::Decimal(d).to_json(), serde_json::json!("123.45"));
        assert_eq!(Value::Int64(-3).to_json(), serde_json::json!(-3));
        assert_eq!(Value::Float64(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(Value::Binary(vec![1, 2]).to_json(), serde_json::json!([1, 2]));
    }
}
