//! Registry observers.
//!
//! A [`crate::registry::ParserRegistry`] reports projector builds, parser registrations, clears
//! and entry-point failures to an optional [`RegistryObserver`] configured through
//! [`crate::registry::RegistryOptions`]. Failures whose severity meets the configured threshold
//! are additionally reported through [`RegistryObserver::on_alert`].
//!
//! The same events are emitted as `tracing` events regardless of whether an observer is set.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ProjectionError;
use crate::introspect::{ConstructionPlan, MemberMode};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RegistrySeverity {
    /// Informational event.
    Info,
    /// Warning-level event (caller misuse, e.g. a closed cursor).
    Warning,
    /// Error-level event (a projector could not be built, a row failed to convert).
    Error,
    /// Critical error (I/O failures underneath a cursor).
    Critical,
}

impl RegistrySeverity {
    /// Classify an error.
    pub fn of(error: &ProjectionError) -> Self {
        match error {
            ProjectionError::InvalidCursor { .. } => RegistrySeverity::Warning,
            ProjectionError::Io(_) => RegistrySeverity::Critical,
            ProjectionError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => RegistrySeverity::Critical,
                _ => RegistrySeverity::Error,
            },
            _ => RegistrySeverity::Error,
        }
    }
}

/// The target type an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectorContext {
    /// Fully qualified name of the target type.
    pub type_name: &'static str,
}

/// Shape of a freshly built compiled projector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectorStats {
    /// Eligible members in the plan.
    pub members: usize,
    /// Declared members that were dropped.
    pub skipped: usize,
    /// Whether properties or fields are populated.
    pub mode: MemberMode,
    /// Synthetic constructor arguments (0 for a zero-argument constructor).
    pub constructor_arity: usize,
}

impl ProjectorStats {
    pub(crate) fn new<T>(members: usize, skipped: usize, mode: MemberMode, plan: &ConstructionPlan<T>) -> Self {
        Self {
            members,
            skipped,
            mode,
            constructor_arity: plan.arity(),
        }
    }
}

/// Routes failures to tracing and the configured observer, alerting at the threshold.
///
/// Row sequences carry one so failures after the first row are reported the same way as
/// entry-point failures.
#[derive(Clone)]
pub(crate) struct FailureReporter {
    ctx: ProjectorContext,
    observer: Option<Arc<dyn RegistryObserver>>,
    alert_at_or_above: RegistrySeverity,
}

impl FailureReporter {
    pub(crate) fn new(
        ctx: ProjectorContext,
        observer: Option<Arc<dyn RegistryObserver>>,
        alert_at_or_above: RegistrySeverity,
    ) -> Self {
        Self {
            ctx,
            observer,
            alert_at_or_above,
        }
    }

    pub(crate) fn report(&self, err: &ProjectionError) {
        let severity = RegistrySeverity::of(err);
        tracing::warn!(target_type = self.ctx.type_name, ?severity, error = %err, "projection failed");
        if let Some(obs) = self.observer.as_ref() {
            obs.on_failure(&self.ctx, severity, err);
            if severity >= self.alert_at_or_above {
                obs.on_alert(&self.ctx, severity, err);
            }
        }
    }
}

/// Observer interface for registry events.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait RegistryObserver: Send + Sync {
    /// Called once per type when its compiled projector is built.
    fn on_projector_built(&self, _ctx: &ProjectorContext, _stats: ProjectorStats) {}

    /// Called when a parser is registered for a type.
    fn on_parser_registered(&self, _ctx: &ProjectorContext) {}

    /// Called when the registry is cleared.
    fn on_cleared(&self) {}

    /// Called when an entry point, a projector build or a row of a projection fails.
    fn on_failure(&self, _ctx: &ProjectorContext, _severity: RegistrySeverity, _error: &ProjectionError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ProjectorContext, severity: RegistrySeverity, error: &ProjectionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn RegistryObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn RegistryObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl RegistryObserver for CompositeObserver {
    fn on_projector_built(&self, ctx: &ProjectorContext, stats: ProjectorStats) {
        for o in &self.observers {
            o.on_projector_built(ctx, stats);
        }
    }

    fn on_parser_registered(&self, ctx: &ProjectorContext) {
        for o in &self.observers {
            o.on_parser_registered(ctx);
        }
    }

    fn on_cleared(&self) {
        for o in &self.observers {
            o.on_cleared();
        }
    }

    fn on_failure(&self, ctx: &ProjectorContext, severity: RegistrySeverity, error: &ProjectionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &ProjectorContext, severity: RegistrySeverity, error: &ProjectionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs registry events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl RegistryObserver for StdErrObserver {
    fn on_projector_built(&self, ctx: &ProjectorContext, stats: ProjectorStats) {
        eprintln!(
            "[projector][built] type={} mode={} members={} skipped={} ctor_arity={}",
            ctx.type_name, stats.mode, stats.members, stats.skipped, stats.constructor_arity
        );
    }

    fn on_parser_registered(&self, ctx: &ProjectorContext) {
        eprintln!("[projector][registered] type={}", ctx.type_name);
    }

    fn on_cleared(&self) {
        eprintln!("[projector][cleared]");
    }

    fn on_failure(&self, ctx: &ProjectorContext, severity: RegistrySeverity, error: &ProjectionError) {
        eprintln!("[projector][{:?}] type={} err={}", severity, ctx.type_name, error);
    }

    fn on_alert(&self, ctx: &ProjectorContext, severity: RegistrySeverity, error: &ProjectionError) {
        eprintln!("[ALERT][projector][{:?}] type={} err={}", severity, ctx.type_name, error);
    }
}

/// Appends registry events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl RegistryObserver for FileObserver {
    fn on_projector_built(&self, ctx: &ProjectorContext, stats: ProjectorStats) {
        self.append_line(&format!(
            "{} built type={} mode={} members={} skipped={}",
            unix_ts(),
            ctx.type_name,
            stats.mode,
            stats.members,
            stats.skipped
        ));
    }

    fn on_parser_registered(&self, ctx: &ProjectorContext) {
        self.append_line(&format!("{} registered type={}", unix_ts(), ctx.type_name));
    }

    fn on_cleared(&self) {
        self.append_line(&format!("{} cleared", unix_ts()));
    }

    fn on_failure(&self, ctx: &ProjectorContext, severity: RegistrySeverity, error: &ProjectionError) {
        self.append_line(&format!(
            "{} fail severity={:?} type={} err={}",
            unix_ts(),
            severity,
            ctx.type_name,
            error
        ));
    }

    fn on_alert(&self, ctx: &ProjectorContext, severity: RegistrySeverity, error: &ProjectionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} type={} err={}",
            unix_ts(),
            severity,
            ctx.type_name,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
