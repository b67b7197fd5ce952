use thiserror::Error;

/// Convenience result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Error type returned by cursors, parsers and the projector registry.
///
/// Null cells never produce an error; they resolve to the category default.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The cursor is closed (or otherwise unusable) at an entry point.
    #[error("invalid cursor: {message}")]
    InvalidCursor { message: String },

    /// The target type declares no public constructor, so no projector can be built.
    #[error("cannot build projector for '{type_name}': it must declare a zero-argument constructor or one that accepts default values")]
    UnconstructibleType { type_name: &'static str },

    /// A generic numeric conversion could not represent the stored value.
    #[error("failed to convert column {ordinal} to {target}: {message} (raw='{raw}')")]
    ConversionFailure {
        ordinal: usize,
        target: &'static str,
        raw: String,
        message: String,
    },

    /// A typed getter was used on a cell holding a different shape.
    #[error("column {ordinal} holds {found}, expected {expected}")]
    ColumnTypeMismatch {
        ordinal: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// The ordinal is not addressable in the current row.
    #[error("column ordinal {ordinal} out of range (field count {field_count})")]
    OrdinalOutOfRange { ordinal: usize, field_count: usize },

    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV cursor error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decoding error (schema files, JSON row sources).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A cursor source does not conform to the provided schema.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A source value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },
}

impl ProjectionError {
    pub(crate) fn closed_cursor() -> Self {
        Self::InvalidCursor {
            message: "cursor is closed".to_string(),
        }
    }
}
