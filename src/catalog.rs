//! Scalar category catalog.
//!
//! Every supported member or scalar target type maps to exactly one [`ScalarCategory`]. A
//! category pairs an [`ExtractionRule`] (how the cell is fetched from a [`RowCursor`]) with a null
//! default (what a null cell turns into). The catalog is closed and immutable; projectors share it.
//!
//! Null handling is uniform: a null cell never raises an error. Non-nullable targets receive
//! their zero value, nullable (`Option<_>`) targets receive `None`.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::io;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::cursor::RowCursor;
use crate::error::{ProjectionError, ProjectionResult};
use crate::types::Value;

/// Opaque binary stream target type.
pub type BinaryStream = io::Cursor<Vec<u8>>;

const CHUNK_LEN: usize = 4096;

/// Closed set of supported value shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarCategory {
    Bool,
    NullableBool,
    UInt8,
    NullableUInt8,
    Int8,
    NullableInt8,
    Int16,
    NullableInt16,
    UInt16,
    NullableUInt16,
    Int32,
    NullableInt32,
    UInt32,
    NullableUInt32,
    Int64,
    NullableInt64,
    UInt64,
    NullableUInt64,
    Float32,
    NullableFloat32,
    Float64,
    NullableFloat64,
    Decimal,
    NullableDecimal,
    DateTime,
    NullableDateTime,
    Uuid,
    NullableUuid,
    String,
    NullableString,
    Char,
    NullableChar,
    /// `Vec<u8>`, empty on null.
    Bytes,
    /// `Vec<char>`, empty on null.
    Chars,
    /// [`BinaryStream`], empty on null.
    Stream,
}

/// Exact cursor getter used by the direct rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Getter {
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    DateTime,
    Guid,
    String,
}

/// Named numeric conversion for widths the cursor has no exact getter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    ToInt8,
    ToUInt16,
    ToUInt32,
    ToUInt64,
}

/// Dedicated helpers that perform their own null check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    Bytes,
    Chars,
    Stream,
    /// First character of a text cell.
    CharFromString,
}

/// How a category fetches its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Exact getter; a null cell yields the category's zero value.
    DirectGet(Getter),
    /// Exact getter wrapped for a nullable target; a null cell yields `None`.
    NullCheckThenDirectGet(Getter),
    /// Opaque fetch followed by a named conversion.
    NullCheckThenGenericConvert(Conversion),
    /// Byte/char sequences, streams and single characters.
    Helper(Helper),
}

static BY_TYPE: LazyLock<HashMap<TypeId, ScalarCategory>> = LazyLock::new(|| {
    ScalarCategory::ALL
        .iter()
        .map(|category| (category.rust_type_id(), *category))
        .collect()
});

impl ScalarCategory {
    /// Every category, in declaration order.
    pub const ALL: [ScalarCategory; 35] = [
        Self::Bool,
        Self::NullableBool,
        Self::UInt8,
        Self::NullableUInt8,
        Self::Int8,
        Self::NullableInt8,
        Self::Int16,
        Self::NullableInt16,
        Self::UInt16,
        Self::NullableUInt16,
        Self::Int32,
        Self::NullableInt32,
        Self::UInt32,
        Self::NullableUInt32,
        Self::Int64,
        Self::NullableInt64,
        Self::UInt64,
        Self::NullableUInt64,
        Self::Float32,
        Self::NullableFloat32,
        Self::Float64,
        Self::NullableFloat64,
        Self::Decimal,
        Self::NullableDecimal,
        Self::DateTime,
        Self::NullableDateTime,
        Self::Uuid,
        Self::NullableUuid,
        Self::String,
        Self::NullableString,
        Self::Char,
        Self::NullableChar,
        Self::Bytes,
        Self::Chars,
        Self::Stream,
    ];

    /// Classify a Rust type. Returns `None` for unsupported types.
    pub fn of<V: 'static>() -> Option<Self> {
        BY_TYPE.get(&TypeId::of::<V>()).copied()
    }

    /// The Rust type this category produces.
    pub fn rust_type(self) -> &'static str {
        self.describe_type().1
    }

    fn rust_type_id(self) -> TypeId {
        self.describe_type().0
    }

    fn describe_type(self) -> (TypeId, &'static str) {
        fn ty<T: 'static>() -> (TypeId, &'static str) {
            (TypeId::of::<T>(), type_name::<T>())
        }

        match self {
            Self::Bool => ty::<bool>(),
            Self::NullableBool => ty::<Option<bool>>(),
            Self::UInt8 => ty::<u8>(),
            Self::NullableUInt8 => ty::<Option<u8>>(),
            Self::Int8 => ty::<i8>(),
            Self::NullableInt8 => ty::<Option<i8>>(),
            Self::Int16 => ty::<i16>(),
            Self::NullableInt16 => ty::<Option<i16>>(),
            Self::UInt16 => ty::<u16>(),
            Self::NullableUInt16 => ty::<Option<u16>>(),
            Self::Int32 => ty::<i32>(),
            Self::NullableInt32 => ty::<Option<i32>>(),
            Self::UInt32 => ty::<u32>(),
            Self::NullableUInt32 => ty::<Option<u32>>(),
            Self::Int64 => ty::<i64>(),
            Self::NullableInt64 => ty::<Option<i64>>(),
            Self::UInt64 => ty::<u64>(),
            Self::NullableUInt64 => ty::<Option<u64>>(),
            Self::Float32 => ty::<f32>(),
            Self::NullableFloat32 => ty::<Option<f32>>(),
            Self::Float64 => ty::<f64>(),
            Self::NullableFloat64 => ty::<Option<f64>>(),
            Self::Decimal => ty::<Decimal>(),
            Self::NullableDecimal => ty::<Option<Decimal>>(),
            Self::DateTime => ty::<NaiveDateTime>(),
            Self::NullableDateTime => ty::<Option<NaiveDateTime>>(),
            Self::Uuid => ty::<Uuid>(),
            Self::NullableUuid => ty::<Option<Uuid>>(),
            Self::String => ty::<String>(),
            Self::NullableString => ty::<Option<String>>(),
            Self::Char => ty::<char>(),
            Self::NullableChar => ty::<Option<char>>(),
            Self::Bytes => ty::<Vec<u8>>(),
            Self::Chars => ty::<Vec<char>>(),
            Self::Stream => ty::<BinaryStream>(),
        }
    }

    /// Whether a null cell maps to `None` rather than a zero value.
    pub fn is_nullable(self) -> bool {
        matches!(
            self,
            Self::NullableBool
                | Self::NullableUInt8
                | Self::NullableInt8
                | Self::NullableInt16
                | Self::NullableUInt16
                | Self::NullableInt32
                | Self::NullableUInt32
                | Self::NullableInt64
                | Self::NullableUInt64
                | Self::NullableFloat32
                | Self::NullableFloat64
                | Self::NullableDecimal
                | Self::NullableDateTime
                | Self::NullableUuid
                | Self::NullableString
                | Self::NullableChar
        )
    }

    /// The extraction rule for this category.
    pub fn rule(self) -> ExtractionRule {
        use ExtractionRule::{DirectGet, Helper as WithHelper, NullCheckThenDirectGet, NullCheckThenGenericConvert};

        match self {
            Self::Bool => DirectGet(Getter::Bool),
            Self::NullableBool => NullCheckThenDirectGet(Getter::Bool),
            Self::UInt8 => DirectGet(Getter::Byte),
            Self::NullableUInt8 => NullCheckThenDirectGet(Getter::Byte),
            Self::Int8 | Self::NullableInt8 => NullCheckThenGenericConvert(Conversion::ToInt8),
            Self::Int16 => DirectGet(Getter::Int16),
            Self::NullableInt16 => NullCheckThenDirectGet(Getter::Int16),
            Self::UInt16 | Self::NullableUInt16 => NullCheckThenGenericConvert(Conversion::ToUInt16),
            Self::Int32 => DirectGet(Getter::Int32),
            Self::NullableInt32 => NullCheckThenDirectGet(Getter::Int32),
            Self::UInt32 | Self::NullableUInt32 => NullCheckThenGenericConvert(Conversion::ToUInt32),
            Self::Int64 => DirectGet(Getter::Int64),
            Self::NullableInt64 => NullCheckThenDirectGet(Getter::Int64),
            Self::UInt64 | Self::NullableUInt64 => NullCheckThenGenericConvert(Conversion::ToUInt64),
            Self::Float32 => DirectGet(Getter::Float),
            Self::NullableFloat32 => NullCheckThenDirectGet(Getter::Float),
            Self::Float64 => DirectGet(Getter::Double),
            Self::NullableFloat64 => NullCheckThenDirectGet(Getter::Double),
            Self::Decimal => DirectGet(Getter::Decimal),
            Self::NullableDecimal => NullCheckThenDirectGet(Getter::Decimal),
            Self::DateTime => DirectGet(Getter::DateTime),
            Self::NullableDateTime => NullCheckThenDirectGet(Getter::DateTime),
            Self::Uuid => DirectGet(Getter::Guid),
            Self::NullableUuid => NullCheckThenDirectGet(Getter::Guid),
            Self::String => DirectGet(Getter::String),
            Self::NullableString => NullCheckThenDirectGet(Getter::String),
            Self::Char | Self::NullableChar => WithHelper(Helper::CharFromString),
            Self::Bytes => WithHelper(Helper::Bytes),
            Self::Chars => WithHelper(Helper::Chars),
            Self::Stream => WithHelper(Helper::Stream),
        }
    }

    /// The value a null cell resolves to.
    pub fn null_default(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::UInt8 => Value::UInt8(0),
            Self::Int8 => Value::Int8(0),
            Self::Int16 => Value::Int16(0),
            Self::UInt16 => Value::UInt16(0),
            Self::Int32 => Value::Int32(0),
            Self::UInt32 => Value::UInt32(0),
            Self::Int64 => Value::Int64(0),
            Self::UInt64 => Value::UInt64(0),
            Self::Float32 => Value::Float32(0.0),
            Self::Float64 => Value::Float64(0.0),
            Self::Decimal => Value::Decimal(Decimal::ZERO),
            Self::DateTime => Value::DateTime(NaiveDateTime::default()),
            Self::Uuid => Value::Uuid(Uuid::nil()),
            Self::String | Self::Char | Self::Chars => Value::Utf8(String::new()),
            Self::Bytes | Self::Stream => Value::Binary(Vec::new()),
            _ => Value::Null,
        }
    }

    /// Fetch the cell at `ordinal` according to [`Self::rule`], applying the null default.
    pub fn read(self, cursor: &dyn RowCursor, ordinal: usize) -> ProjectionResult<Value> {
        match self.rule() {
            ExtractionRule::DirectGet(getter) => {
                if cursor.is_null(ordinal)? {
                    Ok(self.null_default())
                } else {
                    getter.fetch(cursor, ordinal)
                }
            }
            ExtractionRule::NullCheckThenDirectGet(getter) => {
                if cursor.is_null(ordinal)? {
                    Ok(Value::Null)
                } else {
                    getter.fetch(cursor, ordinal)
                }
            }
            ExtractionRule::NullCheckThenGenericConvert(conversion) => {
                if cursor.is_null(ordinal)? {
                    return Ok(self.null_default());
                }
                let raw = cursor.get_value(ordinal)?;
                conversion
                    .apply(&raw)
                    .map_err(|message| ProjectionError::ConversionFailure {
                        ordinal,
                        target: conversion.target(),
                        raw: raw.to_string(),
                        message,
                    })
            }
            ExtractionRule::Helper(helper) => match helper {
                Helper::Bytes | Helper::Stream => read_bytes(cursor, ordinal).map(Value::Binary),
                Helper::Chars => {
                    read_chars(cursor, ordinal).map(|chars| Value::Utf8(chars.into_iter().collect()))
                }
                Helper::CharFromString => {
                    if cursor.is_null(ordinal)? {
                        Ok(self.null_default())
                    } else {
                        cursor.get_string(ordinal).map(Value::Utf8)
                    }
                }
            },
        }
    }

    /// Fetch the cell at `ordinal` as the Rust type `V` this category stands for.
    pub fn extract<V: 'static>(self, cursor: &dyn RowCursor, ordinal: usize) -> ProjectionResult<V> {
        let value = self.read(cursor, ordinal)?;
        let found = value.type_name();
        self.materialize(value)
            .ok_or(ProjectionError::ColumnTypeMismatch {
                ordinal,
                expected: type_name::<V>(),
                found,
            })
    }

    fn materialize<V: 'static>(self, value: Value) -> Option<V> {
        macro_rules! take {
            ($variant:ident) => {
                match value {
                    Value::$variant(v) => v,
                    _ => return None,
                }
            };
        }
        macro_rules! take_opt {
            ($variant:ident) => {
                match value {
                    Value::Null => None,
                    Value::$variant(v) => Some(v),
                    _ => return None,
                }
            };
        }

        match self {
            Self::Bool => coerce(take!(Bool)),
            Self::NullableBool => coerce(take_opt!(Bool)),
            Self::UInt8 => coerce(take!(UInt8)),
            Self::NullableUInt8 => coerce(take_opt!(UInt8)),
            Self::Int8 => coerce(take!(Int8)),
            Self::NullableInt8 => coerce(take_opt!(Int8)),
            Self::Int16 => coerce(take!(Int16)),
            Self::NullableInt16 => coerce(take_opt!(Int16)),
            Self::UInt16 => coerce(take!(UInt16)),
            Self::NullableUInt16 => coerce(take_opt!(UInt16)),
            Self::Int32 => coerce(take!(Int32)),
            Self::NullableInt32 => coerce(take_opt!(Int32)),
            Self::UInt32 => coerce(take!(UInt32)),
            Self::NullableUInt32 => coerce(take_opt!(UInt32)),
            Self::Int64 => coerce(take!(Int64)),
            Self::NullableInt64 => coerce(take_opt!(Int64)),
            Self::UInt64 => coerce(take!(UInt64)),
            Self::NullableUInt64 => coerce(take_opt!(UInt64)),
            Self::Float32 => coerce(take!(Float32)),
            Self::NullableFloat32 => coerce(take_opt!(Float32)),
            Self::Float64 => coerce(take!(Float64)),
            Self::NullableFloat64 => coerce(take_opt!(Float64)),
            Self::Decimal => coerce(take!(Decimal)),
            Self::NullableDecimal => coerce(take_opt!(Decimal)),
            Self::DateTime => coerce(take!(DateTime)),
            Self::NullableDateTime => coerce(take_opt!(DateTime)),
            Self::Uuid => coerce(take!(Uuid)),
            Self::NullableUuid => coerce(take_opt!(Uuid)),
            Self::String => coerce(take!(Utf8)),
            Self::NullableString => coerce(take_opt!(Utf8)),
            Self::Char => coerce(take!(Utf8).chars().next().unwrap_or('\0')),
            Self::NullableChar => coerce(take_opt!(Utf8).and_then(|s| s.chars().next())),
            Self::Bytes => coerce(take!(Binary)),
            Self::Chars => coerce(take!(Utf8).chars().collect::<Vec<char>>()),
            Self::Stream => coerce(BinaryStream::new(take!(Binary))),
        }
    }
}

/// Moves `value` into `V` when both are the same type.
fn coerce<S: 'static, V: 'static>(value: S) -> Option<V> {
    let mut slot = Some(value);
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<V>>()
        .and_then(Option::take)
}

impl Getter {
    fn fetch(self, cursor: &dyn RowCursor, ordinal: usize) -> ProjectionResult<Value> {
        Ok(match self {
            Getter::Bool => Value::Bool(cursor.get_bool(ordinal)?),
            Getter::Byte => Value::UInt8(cursor.get_u8(ordinal)?),
            Getter::Int16 => Value::Int16(cursor.get_i16(ordinal)?),
            Getter::Int32 => Value::Int32(cursor.get_i32(ordinal)?),
            Getter::Int64 => Value::Int64(cursor.get_i64(ordinal)?),
            Getter::Float => Value::Float32(cursor.get_f32(ordinal)?),
            Getter::Double => Value::Float64(cursor.get_f64(ordinal)?),
            Getter::Decimal => Value::Decimal(cursor.get_decimal(ordinal)?),
            Getter::DateTime => Value::DateTime(cursor.get_datetime(ordinal)?),
            Getter::Guid => Value::Uuid(cursor.get_uuid(ordinal)?),
            Getter::String => Value::Utf8(cursor.get_string(ordinal)?),
        })
    }
}

impl Conversion {
    /// Name of the target width, for error messages.
    pub fn target(self) -> &'static str {
        match self {
            Conversion::ToInt8 => "i8",
            Conversion::ToUInt16 => "u16",
            Conversion::ToUInt32 => "u32",
            Conversion::ToUInt64 => "u64",
        }
    }

    /// Convert an opaque value.
    ///
    /// Integers are range checked, floats and decimals are rounded half-to-even first, booleans
    /// become 0/1 and text is trimmed and parsed. Other shapes cannot be converted.
    pub fn apply(self, value: &Value) -> Result<Value, String> {
        let n = integral(value)?;
        let out = match self {
            Conversion::ToInt8 => i8::try_from(n).map(Value::Int8),
            Conversion::ToUInt16 => u16::try_from(n).map(Value::UInt16),
            Conversion::ToUInt32 => u32::try_from(n).map(Value::UInt32),
            Conversion::ToUInt64 => u64::try_from(n).map(Value::UInt64),
        };
        out.map_err(|_| format!("value was either too large or too small for {}", self.target()))
    }
}

fn integral(value: &Value) -> Result<i128, String> {
    match value {
        Value::Bool(v) => Ok(i128::from(*v)),
        Value::Int8(v) => Ok(i128::from(*v)),
        Value::UInt8(v) => Ok(i128::from(*v)),
        Value::Int16(v) => Ok(i128::from(*v)),
        Value::UInt16(v) => Ok(i128::from(*v)),
        Value::Int32(v) => Ok(i128::from(*v)),
        Value::UInt32(v) => Ok(i128::from(*v)),
        Value::Int64(v) => Ok(i128::from(*v)),
        Value::UInt64(v) => Ok(i128::from(*v)),
        Value::Float32(v) => round_float(f64::from(*v)),
        Value::Float64(v) => round_float(*v),
        Value::Decimal(d) => d
            .round()
            .to_i128()
            .ok_or_else(|| "decimal is out of range".to_string()),
        Value::Utf8(s) => s.trim().parse::<i128>().map_err(|e| e.to_string()),
        other => Err(format!("invalid cast from {}", other.type_name())),
    }
}

fn round_float(v: f64) -> Result<i128, String> {
    if !v.is_finite() {
        return Err("value is not a finite number".to_string());
    }
    let rounded = v.round_ties_even();
    // i128 covers every target width; anything outside it is out of range for all of them.
    if rounded < i128::MIN as f64 || rounded >= i128::MAX as f64 {
        return Err("value is out of range".to_string());
    }
    Ok(rounded as i128)
}

/// Read a whole binary cell in chunks. A null cell yields an empty vector.
pub fn read_bytes(cursor: &dyn RowCursor, ordinal: usize) -> ProjectionResult<Vec<u8>> {
    if cursor.is_null(ordinal)? {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut buf = [0u8; CHUNK_LEN];
    loop {
        let n = cursor.get_bytes(ordinal, out.len(), &mut buf)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

/// Read a whole text cell as characters in chunks. A null cell yields an empty vector.
pub fn read_chars(cursor: &dyn RowCursor, ordinal: usize) -> ProjectionResult<Vec<char>> {
    if cursor.is_null(ordinal)? {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut buf = ['\0'; CHUNK_LEN];
    loop {
        let n = cursor.get_chars(ordinal, out.len(), &mut buf)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::{BinaryStream, Conversion, ExtractionRule, Getter, Helper, ScalarCategory};
    use crate::cursor::{DataSetCursor, RowCursor};
    use crate::error::ProjectionError;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn one_row(data_type: DataType, value: Value) -> DataSetCursor {
        let schema = Schema::new(vec![Field::new("c", data_type)]);
        let mut cursor = DataSetCursor::new(DataSet::new(schema, vec![vec![value]]));
        assert!(cursor.advance().unwrap());
        cursor
    }

    #[test]
    fn classifies_rust_types() {
        assert_eq!(ScalarCategory::of::<i32>(), Some(ScalarCategory::Int32));
        assert_eq!(ScalarCategory::of::<Option<i64>>(), Some(ScalarCategory::NullableInt64));
        assert_eq!(ScalarCategory::of::<BinaryStream>(), Some(ScalarCategory::Stream));
        assert_eq!(ScalarCategory::of::<Vec<char>>(), Some(ScalarCategory::Chars));
        assert_eq!(ScalarCategory::of::<Vec<String>>(), None);
        assert_eq!(ScalarCategory::of::<Option<Vec<u8>>>(), None);

        assert_eq!(ScalarCategory::Decimal.rust_type(), std::any::type_name::<Decimal>());
        assert_eq!(ScalarCategory::NullableUInt16.rust_type(), std::any::type_name::<Option<u16>>());
    }

    #[test]
    fn every_category_round_trips_through_its_type() {
        assert_eq!(super::BY_TYPE.len(), ScalarCategory::ALL.len());
        for category in ScalarCategory::ALL {
            assert_eq!(super::BY_TYPE.get(&category.rust_type_id()), Some(&category), "{category:?}");
            // Exactly the `Option<_>` categories resolve null to `Value::Null`.
            assert_eq!(
                category.is_nullable(),
                category.null_default() == Value::Null,
                "{category:?}"
            );
        }
    }

    #[test]
    fn rules_follow_getter_availability() {
        assert_eq!(ScalarCategory::Int32.rule(), ExtractionRule::DirectGet(Getter::Int32));
        assert_eq!(
            ScalarCategory::NullableInt32.rule(),
            ExtractionRule::NullCheckThenDirectGet(Getter::Int32)
        );
        assert_eq!(
            ScalarCategory::NullableUInt32.rule(),
            ExtractionRule::NullCheckThenGenericConvert(Conversion::ToUInt32)
        );
        assert_eq!(ScalarCategory::Bytes.rule(), ExtractionRule::Helper(Helper::Bytes));
    }

    #[test]
    fn null_cells_yield_category_defaults() {
        let cursor = one_row(DataType::Int64, Value::Null);

        assert_eq!(ScalarCategory::Int64.extract::<i64>(&cursor, 0).unwrap(), 0);
        assert_eq!(ScalarCategory::NullableInt64.extract::<Option<i64>>(&cursor, 0).unwrap(), None);
        assert_eq!(ScalarCategory::UInt32.extract::<u32>(&cursor, 0).unwrap(), 0);
        assert_eq!(ScalarCategory::NullableUInt16.extract::<Option<u16>>(&cursor, 0).unwrap(), None);
        assert_eq!(ScalarCategory::String.extract::<String>(&cursor, 0).unwrap(), "");
        assert_eq!(ScalarCategory::Char.extract::<char>(&cursor, 0).unwrap(), '\0');
        assert_eq!(ScalarCategory::Decimal.extract::<Decimal>(&cursor, 0).unwrap(), Decimal::ZERO);
        assert_eq!(
            ScalarCategory::DateTime.extract::<NaiveDateTime>(&cursor, 0).unwrap(),
            NaiveDateTime::default()
        );
        assert_eq!(ScalarCategory::Uuid.extract::<Uuid>(&cursor, 0).unwrap(), Uuid::nil());
        assert!(ScalarCategory::Bytes.extract::<Vec<u8>>(&cursor, 0).unwrap().is_empty());
        assert!(ScalarCategory::Chars.extract::<Vec<char>>(&cursor, 0).unwrap().is_empty());
        assert!(ScalarCategory::Stream.extract::<BinaryStream>(&cursor, 0).unwrap().get_ref().is_empty());
    }

    #[test]
    fn generic_conversion_narrows_opaque_values() {
        let cursor = one_row(DataType::Int64, Value::Int64(65_000));
        assert_eq!(ScalarCategory::UInt16.extract::<u16>(&cursor, 0).unwrap(), 65_000);
        assert_eq!(ScalarCategory::NullableUInt64.extract::<Option<u64>>(&cursor, 0).unwrap(), Some(65_000));

        let err = ScalarCategory::Int8.extract::<i8>(&cursor, 0).unwrap_err();
        match err {
            ProjectionError::ConversionFailure { ordinal, target, raw, .. } => {
                assert_eq!(ordinal, 0);
                assert_eq!(target, "i8");
                assert_eq!(raw, "65000");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn conversion_rounds_half_to_even() {
        assert_eq!(Conversion::ToUInt32.apply(&Value::Float64(2.5)), Ok(Value::UInt32(2)));
        assert_eq!(Conversion::ToUInt32.apply(&Value::Float64(3.5)), Ok(Value::UInt32(4)));
        assert_eq!(
            Conversion::ToInt8.apply(&Value::Decimal(Decimal::new(-125, 1))),
            Ok(Value::Int8(-12))
        );
        assert_eq!(Conversion::ToUInt16.apply(&Value::Utf8(" 42 ".to_string())), Ok(Value::UInt16(42)));
        assert_eq!(Conversion::ToUInt64.apply(&Value::Bool(true)), Ok(Value::UInt64(1)));
        assert!(Conversion::ToUInt64.apply(&Value::Int32(-1)).is_err());
        assert!(Conversion::ToUInt64.apply(&Value::Float64(f64::INFINITY)).is_err());
        assert!(Conversion::ToInt8.apply(&Value::Uuid(Uuid::nil())).is_err());
    }

    #[test]
    fn helpers_read_sequences_and_streams() {
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let cursor = one_row(DataType::Binary, Value::Binary(payload.clone()));
        assert_eq!(ScalarCategory::Bytes.extract::<Vec<u8>>(&cursor, 0).unwrap(), payload);

        let mut stream = ScalarCategory::Stream.extract::<BinaryStream>(&cursor, 0).unwrap();
        let mut read_back = Vec::new();
        stream.read_to_end(&mut read_back).unwrap();
        assert_eq!(read_back, payload);

        let cursor = one_row(DataType::Utf8, Value::Utf8("héllo".to_string()));
        assert_eq!(
            ScalarCategory::Chars.extract::<Vec<char>>(&cursor, 0).unwrap(),
            vec!['h', 'é', 'l', 'l', 'o']
        );
        assert_eq!(ScalarCategory::Char.extract::<char>(&cursor, 0).unwrap(), 'h');
        assert_eq!(ScalarCategory::NullableChar.extract::<Option<char>>(&cursor, 0).unwrap(), Some('h'));
    }

    #[test]
    fn exact_getter_rejects_mismatched_cell() {
        let cursor = one_row(DataType::Int64, Value::Int64(7));
        let err = ScalarCategory::Int32.extract::<i32>(&cursor, 0).unwrap_err();
        assert!(matches!(err, ProjectionError::ColumnTypeMismatch { expected: "int32", .. }));
    }
}
