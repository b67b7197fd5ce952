//! `row-projection` maps forward-only result cursors onto Rust values: scalars, row maps, JSON
//! objects, or record types that describe their members once through [`Projectable`].
//!
//! The primary entrypoints are [`project`] (a lazy [`Rows`] iterator) and [`project_one`], both
//! backed by the process-wide [`ParserRegistry`]. On first use of a record type the registry
//! builds a [`CompiledProjector`] (construction plan plus case-insensitive column → member
//! writers) and reuses it for every later row and cursor.
//!
//! ## Null handling
//!
//! A null cell never raises an error. Non-nullable targets receive their zero value (`0`,
//! `false`, `""`, `'\0'`, `Decimal::ZERO`, `Uuid::nil()`, ...); `Option<_>` targets receive `None`;
//! byte and character sequences become empty.
//!
//! ## Quick example: project records
//!
//! ```rust
//! use row_projection::cursor::DataSetCursor;
//! use row_projection::types::{DataSet, DataType, Field, Schema, Value};
//! use row_projection::{Projectable, TypeDescriptor};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     id: i32,
//!     name: String,
//! }
//!
//! impl Projectable for Person {
//!     fn describe(ty: &mut TypeDescriptor<Self>) {
//!         ty.constructor(Person::default)
//!             .property("Id", |p: &mut Person, v: i32| p.id = v)
//!             .property("Name", |p: &mut Person, v: String| p.name = v);
//!     }
//! }
//!
//! # fn main() -> Result<(), row_projection::ProjectionError> {
//! let schema = Schema::new(vec![
//!     Field::new("id", DataType::Int32),
//!     Field::new("NAME", DataType::Utf8),
//! ]);
//! let mut cursor = DataSetCursor::new(DataSet::new(
//!     schema,
//!     vec![vec![Value::Int32(5), Value::Utf8("Ann".to_string())]],
//! ));
//!
//! let people = row_projection::project::<Person>(&mut cursor)?.collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(people, vec![Person { id: 5, name: "Ann".to_string() }]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Scalars (single column)
//!
//! Scalar targets read ordinal 0 only:
//!
//! ```rust
//! use row_projection::cursor::DataSetCursor;
//! use row_projection::types::{DataSet, DataType, Field, Schema, Value};
//!
//! # fn main() -> Result<(), row_projection::ProjectionError> {
//! let schema = Schema::new(vec![Field::new("total", DataType::Int64)]);
//! let mut cursor = DataSetCursor::new(DataSet::new(schema, vec![vec![Value::Null]]));
//!
//! let total = row_projection::project_one::<Option<i64>>(&mut cursor)?;
//! assert_eq!(total, Some(None));
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom parsers
//!
//! [`register`] installs a [`Parser`] for a type (last registration wins); [`unregister_all`]
//! restores the built-in parsers and drops cached projectors.
//!
//! ## Modules
//!
//! - [`cursor`]: the [`RowCursor`] contract plus in-memory, CSV and JSON sources
//! - [`catalog`]: scalar categories, extraction rules and null defaults
//! - [`introspect`]: [`Projectable`], constructor selection and member classification
//! - [`projector`]: compiled per-type projection plans
//! - [`parser`]: [`Parser`] implementations and the lazy [`Rows`] sequence
//! - [`registry`]: the parser registry / projector cache
//! - [`observability`]: registry observers
//! - [`types`]: schema, values and the in-memory dataset
//! - [`error`]: error types

pub mod catalog;
pub mod cursor;
pub mod error;
pub mod introspect;
pub mod observability;
pub mod parser;
pub mod projector;
pub mod registry;
pub mod types;

pub use catalog::{BinaryStream, ScalarCategory};
pub use cursor::RowCursor;
pub use error::{ProjectionError, ProjectionResult};
pub use introspect::{ConstructionPlan, MemberMode, Projectable, TypeDescriptor};
pub use parser::{Parser, Rows, parser_fn};
pub use projector::CompiledProjector;
pub use registry::{ParserRegistry, RegistryOptions, Resolved};

/// Lazily project every row of `cursor` into `T` using the global registry.
///
/// Fails immediately with [`ProjectionError::InvalidCursor`] if the cursor is closed, and with
/// [`ProjectionError::UnconstructibleType`] if `T` needs a projector but declares no constructor.
pub fn project<T: Projectable>(cursor: &mut dyn RowCursor) -> ProjectionResult<Rows<'_, T>> {
    ParserRegistry::global().project(cursor)
}

/// Project the first row of `cursor` using the global registry, consuming at most one row.
pub fn project_one<T: Projectable>(cursor: &mut dyn RowCursor) -> ProjectionResult<Option<T>> {
    ParserRegistry::global().project_one(cursor)
}

/// `(found, value)` form of [`project_one`]; `value` is `T::default()` when no row exists.
pub fn project_one_or_default<T: Projectable + Default>(cursor: &mut dyn RowCursor) -> ProjectionResult<(bool, T)> {
    ParserRegistry::global().project_one_or_default(cursor)
}

/// Register `parser` for `T` in the global registry.
pub fn register<T: 'static>(parser: impl Parser<T> + 'static) {
    ParserRegistry::global().register::<T>(parser)
}

/// Restore the global registry to its built-in parsers.
pub fn unregister_all() {
    ParserRegistry::global().clear()
}
