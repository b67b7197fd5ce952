//! Process-wide parser registry and projector cache.
//!
//! [`ParserRegistry::resolve`] returns the parser registered for a type, or builds (once) and
//! caches a [`CompiledProjector`] for it. Built-in parsers cover every scalar category plus
//! row maps and JSON rows; [`ParserRegistry::clear`] restores exactly that state.
//!
//! Concurrency:
//!
//! - Parser entries sit behind an `RwLock`; `register` and `clear` take the write side, so they
//!   are serialized against `resolve` and the last writer wins.
//! - Each type key owns a slot guarded by its own mutex. The first caller builds the projector
//!   while holding the slot; concurrent callers for the same type wait and then share the result.
//!   A failed build leaves the slot empty.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, PoisonError, RwLock};

use crate::catalog::BinaryStream;
use crate::cursor::RowCursor;
use crate::error::{ProjectionError, ProjectionResult};
use crate::introspect::Projectable;
use crate::observability::{FailureReporter, ProjectorContext, RegistryObserver, RegistrySeverity};
use crate::parser::{JsonRowParser, Parser, RowMapParser, RowReader, Rows, ScalarParser};
use crate::projector::CompiledProjector;
use crate::types::Value;

/// Options controlling registry behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct RegistryOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn RegistryObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: RegistrySeverity,
}

impl fmt::Debug for RegistryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: RegistrySeverity::Critical,
        }
    }
}

/// What a type resolves to.
pub enum Resolved<T> {
    /// A registered (or built-in) parser.
    Parser(Arc<dyn Parser<T>>),
    /// The cached compiled projector.
    Projector(Arc<CompiledProjector<T>>),
}

impl<T> Clone for Resolved<T> {
    fn clone(&self) -> Self {
        match self {
            Resolved::Parser(p) => Resolved::Parser(Arc::clone(p)),
            Resolved::Projector(p) => Resolved::Projector(Arc::clone(p)),
        }
    }
}

struct RegisteredParser {
    type_name: &'static str,
    // Holds an `Arc<dyn Parser<T>>` for the keyed `T`.
    parser: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct ProjectorSlot {
    // Holds an `Arc<CompiledProjector<T>>` once built.
    built: Mutex<Option<Arc<dyn Any + Send + Sync>>>,
}

/// Map from type identity to parser or compiled projector.
pub struct ParserRegistry {
    parsers: RwLock<HashMap<TypeId, RegisteredParser>>,
    projectors: Mutex<HashMap<TypeId, Arc<ProjectorSlot>>>,
    options: RegistryOptions,
}

static GLOBAL: LazyLock<ParserRegistry> = LazyLock::new(ParserRegistry::new);

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parsers = self.parsers.read().map(|p| p.len()).unwrap_or_default();
        let projectors = self.projectors.lock().map(|p| p.len()).unwrap_or_default();
        f.debug_struct("ParserRegistry")
            .field("parsers", &parsers)
            .field("projector_slots", &projectors)
            .field("options", &self.options)
            .finish()
    }
}

impl ParserRegistry {
    /// A registry holding only the built-in parsers.
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            parsers: RwLock::new(builtin_parsers()),
            projectors: Mutex::new(HashMap::new()),
            options,
        }
    }

    /// The process-wide registry used by the crate-level functions.
    pub fn global() -> &'static ParserRegistry {
        &GLOBAL
    }

    /// Register `parser` for `T`, replacing any earlier registration.
    pub fn register<T: 'static>(&self, parser: impl Parser<T> + 'static) {
        let ctx = ProjectorContext {
            type_name: type_name::<T>(),
        };
        let parser: Arc<dyn Parser<T>> = Arc::new(parser);
        self.write_parsers().insert(
            TypeId::of::<T>(),
            RegisteredParser {
                type_name: ctx.type_name,
                parser: Arc::new(parser),
            },
        );
        tracing::debug!(target_type = ctx.type_name, "registered parser");
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_parser_registered(&ctx);
        }
    }

    /// Drop every registration and cached projector, then restore the built-in parsers.
    pub fn clear(&self) {
        {
            let mut parsers = self.write_parsers();
            *parsers = builtin_parsers();
            self.projectors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
        tracing::debug!("registry cleared");
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_cleared();
        }
    }

    /// Whether a parser (built-in or registered) exists for `T`.
    pub fn has_parser<T: 'static>(&self) -> bool {
        self.read_parsers().contains_key(&TypeId::of::<T>())
    }

    /// Names of every type with a parser, sorted.
    pub fn parser_types(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.read_parsers().values().map(|p| p.type_name).collect();
        names.sort_unstable();
        names
    }

    /// Parser for `T` if one is registered, else the compiled projector (built on first use).
    pub fn resolve<T: Projectable>(&self) -> ProjectionResult<Resolved<T>> {
        match self.parser::<T>() {
            Some(parser) => Ok(Resolved::Parser(parser)),
            None => self.projector::<T>().map(Resolved::Projector),
        }
    }

    fn parser<T: 'static>(&self) -> Option<Arc<dyn Parser<T>>> {
        self.read_parsers()
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.parser.downcast_ref::<Arc<dyn Parser<T>>>())
            .cloned()
    }

    /// The compiled projector for `T`, building it at most once.
    pub fn projector<T: Projectable>(&self) -> ProjectionResult<Arc<CompiledProjector<T>>> {
        let slot = {
            let mut slots = self.projectors.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(TypeId::of::<T>()).or_default())
        };

        let mut built = slot.built.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = built.as_ref() {
            if let Ok(projector) = Arc::clone(existing).downcast::<CompiledProjector<T>>() {
                return Ok(projector);
            }
        }

        let ctx = ProjectorContext {
            type_name: type_name::<T>(),
        };
        match CompiledProjector::<T>::build() {
            Ok(projector) => {
                let projector = Arc::new(projector);
                let shared: Arc<dyn Any + Send + Sync> = projector.clone();
                *built = Some(shared);
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_projector_built(&ctx, projector.stats());
                }
                Ok(projector)
            }
            Err(err) => {
                self.report_failure(&ctx, &err);
                Err(err)
            }
        }
    }

    /// Lazily project every row of `cursor` into `T`.
    ///
    /// Failures, whether raised here or by a later row, are reported to the observer.
    pub fn project<'c, T: Projectable>(&self, cursor: &'c mut dyn RowCursor) -> ProjectionResult<Rows<'c, T>> {
        let reporter = self.reporter(ProjectorContext {
            type_name: type_name::<T>(),
        });
        match self.rows::<T>(cursor) {
            Ok(rows) => Ok(rows.reporting_to(reporter)),
            Err(err) => {
                // Build failures were already reported by `projector`.
                if !matches!(err, ProjectionError::UnconstructibleType { .. }) {
                    reporter.report(&err);
                }
                Err(err)
            }
        }
    }

    fn rows<'c, T: Projectable>(&self, cursor: &'c mut dyn RowCursor) -> ProjectionResult<Rows<'c, T>> {
        if cursor.is_closed() {
            return Err(ProjectionError::closed_cursor());
        }
        let reader = match self.resolve::<T>()? {
            Resolved::Parser(parser) => RowReader::Parser(parser),
            Resolved::Projector(projector) => RowReader::for_projector(projector, &*cursor)?,
        };
        Rows::new(cursor, reader)
    }

    /// Project the first row of `cursor`, consuming at most one row. `None` if there is no row.
    pub fn project_one<T: Projectable>(&self, cursor: &mut dyn RowCursor) -> ProjectionResult<Option<T>> {
        self.project::<T>(cursor)?.next().transpose()
    }

    /// Like [`Self::project_one`], returning `(found, value)` with `T::default()` when not found.
    pub fn project_one_or_default<T: Projectable + Default>(
        &self,
        cursor: &mut dyn RowCursor,
    ) -> ProjectionResult<(bool, T)> {
        Ok(match self.project_one::<T>(cursor)? {
            Some(value) => (true, value),
            None => (false, T::default()),
        })
    }

    fn reporter(&self, ctx: ProjectorContext) -> FailureReporter {
        FailureReporter::new(ctx, self.options.observer.clone(), self.options.alert_at_or_above)
    }

    fn report_failure(&self, ctx: &ProjectorContext, err: &ProjectionError) {
        self.reporter(*ctx).report(err);
    }

    fn read_parsers(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, RegisteredParser>> {
        self.parsers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_parsers(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TypeId, RegisteredParser>> {
        self.parsers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn entry<T: 'static>(parser: Arc<dyn Parser<T>>) -> (TypeId, RegisteredParser) {
    (
        TypeId::of::<T>(),
        RegisteredParser {
            type_name: type_name::<T>(),
            parser: Arc::new(parser),
        },
    )
}

fn builtin_parsers() -> HashMap<TypeId, RegisteredParser> {
    let mut parsers = HashMap::new();

    macro_rules! scalars {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(parser) = ScalarParser::<$ty>::new() {
                    let (key, value) = entry::<$ty>(Arc::new(parser));
                    parsers.insert(key, value);
                }
            )*
        };
    }

    scalars!(
        bool,
        Option<bool>,
        u8,
        Option<u8>,
        i8,
        Option<i8>,
        i16,
        Option<i16>,
        u16,
        Option<u16>,
        i32,
        Option<i32>,
        u32,
        Option<u32>,
        i64,
        Option<i64>,
        u64,
        Option<u64>,
        f32,
        Option<f32>,
        f64,
        Option<f64>,
        rust_decimal::Decimal,
        Option<rust_decimal::Decimal>,
        chrono::NaiveDateTime,
        Option<chrono::NaiveDateTime>,
        uuid::Uuid,
        Option<uuid::Uuid>,
        String,
        Option<String>,
        char,
        Option<char>,
        Vec<u8>,
        Vec<char>,
        BinaryStream,
    );

    let (key, value) = entry::<HashMap<String, Value>>(Arc::new(RowMapParser));
    parsers.insert(key, value);
    let (key, value) = entry::<serde_json::Value>(Arc::new(JsonRowParser));
    parsers.insert(key, value);

    parsers
}
