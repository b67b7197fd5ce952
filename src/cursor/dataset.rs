//! In-memory cursor over a [`DataSet`].

use crate::error::{ProjectionError, ProjectionResult};
use crate::types::{DataSet, Value};

use super::{RowCursor, copy_char_chunk, copy_chunk};

/// A [`RowCursor`] over the rows of an owned [`DataSet`].
///
/// Column names and the field count come from the dataset schema.
#[derive(Debug, Clone)]
pub struct DataSetCursor {
    data: DataSet,
    // Index of the current row; `None` before the first advance.
    position: Option<usize>,
    closed: bool,
}

impl DataSetCursor {
    /// Create a cursor positioned before the first row.
    pub fn new(data: DataSet) -> Self {
        Self {
            data,
            position: None,
            closed: false,
        }
    }

    /// Close the cursor. Closed cursors are rejected by every projection entry point.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn cell(&self, ordinal: usize) -> ProjectionResult<&Value> {
        if self.closed {
            return Err(ProjectionError::closed_cursor());
        }
        let row = self
            .position
            .and_then(|p| self.data.rows.get(p))
            .ok_or_else(|| ProjectionError::InvalidCursor {
                message: "no current row".to_string(),
            })?;
        row.get(ordinal).ok_or(ProjectionError::OrdinalOutOfRange {
            ordinal,
            field_count: row.len(),
        })
    }
}

impl From<DataSet> for DataSetCursor {
    fn from(data: DataSet) -> Self {
        Self::new(data)
    }
}

impl RowCursor for DataSetCursor {
    fn field_count(&self) -> usize {
        self.data.schema.fields.len()
    }

    fn advance(&mut self) -> ProjectionResult<bool> {
        if self.closed {
            return Err(ProjectionError::closed_cursor());
        }
        let next = self.position.map_or(0, |p| p + 1);
        let row_count = self.data.row_count();
        if next < row_count {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(row_count);
            Ok(false)
        }
    }

    fn column_name(&self, ordinal: usize) -> ProjectionResult<&str> {
        self.data
            .schema
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

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn get_string(&self, ordinal: usize) -> ProjectionResult<String> {
        match self.cell(ordinal)? {
            Value::Utf8(s) => Ok(s.clone()),
            other => Err(ProjectionError::ColumnTypeMismatch {
                ordinal,
                expected: "utf8",
                found: other.type_name(),
            }),
        }
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
