//! Row parsers and the lazy row sequence.
//!
//! A [`Parser`] turns the cursor's current row into one value. The registry resolves a parser or
//! a compiled projector per target type; [`Rows`] drives the cursor and applies it row by row.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::catalog::ScalarCategory;
use crate::cursor::RowCursor;
use crate::error::{ProjectionError, ProjectionResult};
use crate::observability::FailureReporter;
use crate::projector::{ColumnBinding, CompiledProjector};
use crate::types::Value;

/// Reads one value from the cursor's current row.
pub trait Parser<T>: Send + Sync {
    fn read_row(&self, cursor: &dyn RowCursor) -> ProjectionResult<T>;

    /// Columns a result must report for the parser to read anything.
    ///
    /// A result with fewer columns ends the sequence on the first row instead of failing.
    fn min_columns(&self) -> usize {
        0
    }
}

/// Single-column parser for scalar targets: reads ordinal 0 only.
pub struct ScalarParser<V> {
    category: ScalarCategory,
    _marker: PhantomData<fn() -> V>,
}

impl<V: 'static> ScalarParser<V> {
    /// Returns `None` when `V` has no scalar category.
    pub fn new() -> Option<Self> {
        ScalarCategory::of::<V>().map(|category| Self {
            category,
            _marker: PhantomData,
        })
    }
}

impl<V: 'static> Parser<V> for ScalarParser<V> {
    fn read_row(&self, cursor: &dyn RowCursor) -> ProjectionResult<V> {
        self.category.extract::<V>(cursor, 0)
    }

    fn min_columns(&self) -> usize {
        1
    }
}

/// Projects each row into a column name → value map. Nulls are kept as [`Value::Null`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RowMapParser;

impl Parser<HashMap<String, Value>> for RowMapParser {
    fn read_row(&self, cursor: &dyn RowCursor) -> ProjectionResult<HashMap<String, Value>> {
        let mut row = HashMap::with_capacity(cursor.field_count());
        for ordinal in 0..cursor.field_count() {
            row.insert(cursor.column_name(ordinal)?.to_owned(), cursor.get_value(ordinal)?);
        }
        Ok(row)
    }
}

/// Projects each row into a JSON object keyed by column name.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRowParser;

impl Parser<serde_json::Value> for JsonRowParser {
    fn read_row(&self, cursor: &dyn RowCursor) -> ProjectionResult<serde_json::Value> {
        let mut object = serde_json::Map::with_capacity(cursor.field_count());
        for ordinal in 0..cursor.field_count() {
            object.insert(cursor.column_name(ordinal)?.to_owned(), cursor.get_value(ordinal)?.to_json());
        }
        Ok(serde_json::Value::Object(object))
    }
}

/// A parser backed by a closure. See [`parser_fn`].
pub struct FnParser<F> {
    f: F,
}

/// Wrap a closure as a [`Parser`].
///
/// ```
/// use row_projection::{RowCursor, parser_fn};
///
/// let upper = parser_fn(|cursor: &dyn RowCursor| Ok(cursor.get_string(0)?.to_uppercase()));
/// # let _ = upper;
/// ```
pub fn parser_fn<T, F>(f: F) -> FnParser<F>
where
    F: Fn(&dyn RowCursor) -> ProjectionResult<T> + Send + Sync,
{
    FnParser { f }
}

impl<T, F> Parser<T> for FnParser<F>
where
    F: Fn(&dyn RowCursor) -> ProjectionResult<T> + Send + Sync,
{
    fn read_row(&self, cursor: &dyn RowCursor) -> ProjectionResult<T> {
        (self.f)(cursor)
    }
}

/// Where a [`Rows`] sequence is in its cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    NotStarted,
    RowAvailable,
    Exhausted,
}

pub(crate) enum RowReader<T> {
    Parser(Arc<dyn Parser<T>>),
    Projector {
        projector: Arc<CompiledProjector<T>>,
        binding: ColumnBinding<T>,
    },
}

impl<T> RowReader<T> {
    pub(crate) fn for_projector(projector: Arc<CompiledProjector<T>>, cursor: &dyn RowCursor) -> ProjectionResult<Self> {
        let binding = projector.bind(cursor)?;
        Ok(RowReader::Projector { projector, binding })
    }

    fn min_columns(&self) -> usize {
        match self {
            RowReader::Parser(parser) => parser.min_columns(),
            RowReader::Projector { .. } => 0,
        }
    }

    fn read(&self, cursor: &dyn RowCursor) -> ProjectionResult<T> {
        match self {
            RowReader::Parser(parser) => parser.read_row(cursor),
            RowReader::Projector { projector, binding } => projector.apply_bound(binding, cursor),
        }
    }
}

/// Lazy sequence of projected rows, in cursor order.
///
/// Each call to `next` advances the cursor once. The sequence ends when the cursor is exhausted;
/// after an error it yields nothing further.
pub struct Rows<'c, T> {
    cursor: &'c mut dyn RowCursor,
    reader: RowReader<T>,
    state: ScanState,
    reporter: Option<FailureReporter>,
}

impl<'c, T> Rows<'c, T> {
    pub(crate) fn new(cursor: &'c mut dyn RowCursor, reader: RowReader<T>) -> ProjectionResult<Self> {
        if cursor.is_closed() {
            return Err(ProjectionError::closed_cursor());
        }
        Ok(Self {
            cursor,
            reader,
            state: ScanState::NotStarted,
            reporter: None,
        })
    }

    pub(crate) fn reporting_to(mut self, reporter: FailureReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    fn step(&mut self) -> ProjectionResult<Option<T>> {
        if self.state == ScanState::Exhausted {
            return Ok(None);
        }
        if !self.cursor.advance()? {
            self.state = ScanState::Exhausted;
            return Ok(None);
        }
        if self.state == ScanState::NotStarted && self.cursor.field_count() < self.reader.min_columns() {
            self.state = ScanState::Exhausted;
            return Ok(None);
        }
        self.state = ScanState::RowAvailable;
        self.reader.read(&*self.cursor).map(Some)
    }
}

impl<T> Iterator for Rows<'_, T> {
    type Item = ProjectionResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => None,
            Err(err) => {
                self.state = ScanState::Exhausted;
                if let Some(reporter) = &self.reporter {
                    reporter.report(&err);
                }
                Some(Err(err))
            }
        }
    }
}
