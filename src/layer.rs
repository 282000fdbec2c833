use crate::logger::{DbLogger, Logger};
use crate::provider::DbLoggerProvider;
use crate::record::{EventId, ExceptionInfo, LogLevel};
use std::cell::Cell;
use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Targets whose events are never written, since they come from the
/// database driver the layer itself is using.
const DRIVER_TARGET_PREFIX: &str = "sqlx";

thread_local! {
    static WRITING: Cell<bool> = const { Cell::new(false) };
}

/// `tracing_subscriber` layer that writes every event to the database
/// through a [`DbLogger`](crate::logger::DbLogger) for the event's target.
///
/// Writes happen synchronously on the thread that emitted the event. The
/// layer reads these event fields:
/// - `message`: the formatted message.
/// - `event_id` (integer) and `event_name` (string).
/// - any field recorded as a `dyn Error`, which becomes the attached error.
/// - `exception_message`, `exception_stack_trace`, `exception_source`
///   (strings) to set error attributes explicitly.
pub struct DbLogLayer {
    provider: DbLoggerProvider,
    /// One writer per category, keyed by event target.
    loggers: RwLock<HashMap<&'static str, Arc<DbLogger>>>,
    /// Total events seen by the layer.
    pub total_events: Arc<AtomicU64>,
    /// Events written to the database.
    pub written_events: Arc<AtomicU64>,
    /// Events whose write failed.
    pub failed_events: Arc<AtomicU64>,
}

impl DbLogLayer {
    pub fn new(provider: DbLoggerProvider) -> Self {
        Self {
            provider,
            loggers: RwLock::new(HashMap::new()),
            total_events: Arc::new(AtomicU64::new(0)),
            written_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Writer for `target`, created on first use.
    fn logger_for(&self, target: &'static str) -> Arc<DbLogger> {
        let cached = self
            .loggers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(target)
            .cloned();
        if let Some(logger) = cached {
            return logger;
        }

        let mut loggers = self.loggers.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            loggers
                .entry(target)
                .or_insert_with(|| Arc::new(self.provider.create_logger(target))),
        )
    }
}

impl<S> Layer<S> for DbLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if meta.target().starts_with(DRIVER_TARGET_PREFIX) || WRITING.with(Cell::get) {
            return;
        }

        let mut fields = EventFields::new(meta.module_path());
        event.record(&mut fields);

        let logger = self.logger_for(meta.target());
        let level = LogLevel::from(*meta.level());
        let event_id = EventId {
            id: fields.event_id.unwrap_or_default(),
            name: fields.event_name.take(),
        };
        let message = fields.message.take().unwrap_or_default();

        let _guard = WritingGuard::enter();
        match logger.log(level, &event_id, &message, fields.error.as_ref(), &format_message) {
            Ok(()) => {
                self.written_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!(
                    "failed to write log entry to {}: {}",
                    logger.options().log_table,
                    e
                );
            }
        }
    }
}

fn format_message(message: &String, _error: Option<&ExceptionInfo>) -> String {
    message.clone()
}

struct WritingGuard;

impl WritingGuard {
    fn enter() -> Self {
        WRITING.with(|writing| writing.set(true));
        WritingGuard
    }
}

impl Drop for WritingGuard {
    fn drop(&mut self) {
        WRITING.with(|writing| writing.set(false));
    }
}

/// Collects the fields of one event that map onto log columns.
struct EventFields {
    module_path: Option<&'static str>,
    message: Option<String>,
    event_id: Option<i64>,
    event_name: Option<String>,
    error: Option<ExceptionInfo>,
}

impl EventFields {
    fn new(module_path: Option<&'static str>) -> Self {
        Self {
            module_path,
            message: None,
            event_id: None,
            event_name: None,
            error: None,
        }
    }

    fn error_mut(&mut self) -> &mut ExceptionInfo {
        self.error.get_or_insert_with(ExceptionInfo::default)
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "event_name" => self.event_name = Some(value.to_string()),
            "exception_message" => self.error_mut().message = Some(value.to_string()),
            "exception_stack_trace" => self.error_mut().stack_trace = Some(value.to_string()),
            "exception_source" => self.error_mut().source = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == "event_id" {
            self.event_id = Some(value);
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "event_id" {
            self.event_id = i64::try_from(value).ok();
        }
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn Error + 'static)) {
        let captured = ExceptionInfo::from_error(value, self.module_path);
        let error = self.error_mut();
        // Explicit exception_* fields win over what the error value reports.
        error.message = error.message.take().or(captured.message);
        error.stack_trace = error.stack_trace.take().or(captured.stack_trace);
        error.source = error.source.take().or(captured.source);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}
