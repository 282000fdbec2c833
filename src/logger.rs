use crate::error::Result;
use crate::field::LogField;
use crate::options::DbLoggerOptions;
use crate::record::{is_blank, EventId, ExceptionInfo, LogLevel, LogRow};
use crate::sink::{Connector, InsertStatement};
use chrono::Local;
use std::convert::Infallible;
use std::sync::Arc;

/// Capabilities every logger exposes to the host.
pub trait Logger {
    /// Handle returned by [`Logger::begin_scope`].
    type Scope;

    fn is_enabled(&self, level: LogLevel) -> bool;

    /// Record one event.
    ///
    /// `formatter` turns `state` (and the optional error) into the
    /// human-readable message. It is only invoked when the message is
    /// actually recorded.
    fn log<S>(
        &self,
        level: LogLevel,
        event_id: &EventId,
        state: &S,
        error: Option<&ExceptionInfo>,
        formatter: &dyn Fn(&S, Option<&ExceptionInfo>) -> String,
    ) -> Result<()>;

    fn begin_scope<S>(&self, state: &S) -> Option<Self::Scope>;
}

/// Writes each enabled log event as one row of the configured table.
///
/// Holds nothing but the category name, the shared options and the
/// connector; every call opens and closes its own connection.
#[derive(Clone)]
pub struct DbLogger {
    category: String,
    options: Arc<DbLoggerOptions>,
    connector: Arc<dyn Connector>,
}

impl DbLogger {
    pub fn new(category: impl Into<String>, options: Arc<DbLoggerOptions>, connector: Arc<dyn Connector>) -> Self {
        Self {
            category: category.into(),
            options,
            connector,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn options(&self) -> &DbLoggerOptions {
        &self.options
    }

    /// Build the row for an event without touching the database.
    ///
    /// Fields are filled in `log_fields` order. A value that is blank is
    /// never assigned, so the column keeps its empty-string default.
    pub fn build_row<S>(
        &self,
        level: LogLevel,
        event_id: &EventId,
        state: &S,
        error: Option<&ExceptionInfo>,
        formatter: &dyn Fn(&S, Option<&ExceptionInfo>) -> String,
    ) -> LogRow {
        let mut row = LogRow::empty(Local::now());

        for field in self.options.fields() {
            match field {
                LogField::LogLevel => assign(&mut row.log_level, Some(level.as_str())),
                LogField::ThreadId => row.thread_id = current_thread_id(),
                LogField::EventId => row.event_id = event_id.id.to_string(),
                LogField::EventName => assign(&mut row.event_name, event_id.name.as_deref()),
                LogField::Message => {
                    let message = formatter(state, error);
                    assign(&mut row.message, Some(&message));
                }
                LogField::ExceptionMessage => {
                    assign(&mut row.exception_message, error.and_then(|e| e.message.as_deref()))
                }
                LogField::ExceptionStackTrace => assign(
                    &mut row.exception_stack_trace,
                    error.and_then(|e| e.stack_trace.as_deref()),
                ),
                LogField::ExceptionSource => {
                    assign(&mut row.exception_source, error.and_then(|e| e.source.as_deref()))
                }
            }
        }

        row
    }

    /// Insert `row` over a fresh connection.
    ///
    /// The connection is closed whether or not the insert succeeded; an
    /// insert failure takes precedence over a close failure.
    pub fn write_row(&self, row: &LogRow) -> Result<()> {
        let statement = InsertStatement::for_row(&self.options, row);

        let mut connection = self.connector.open(&self.options.connection_string)?;
        let executed = connection.execute(&statement);
        let closed = connection.close();

        executed?;
        closed
    }
}

impl Logger for DbLogger {
    /// Scopes are not supported, so no scope value can ever exist.
    type Scope = Infallible;

    fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None
    }

    fn log<S>(
        &self,
        level: LogLevel,
        event_id: &EventId,
        state: &S,
        error: Option<&ExceptionInfo>,
        formatter: &dyn Fn(&S, Option<&ExceptionInfo>) -> String,
    ) -> Result<()> {
        if !self.is_enabled(level) {
            return Ok(());
        }

        let row = self.build_row(level, event_id, state, error, formatter);
        self.write_row(&row)
    }

    fn begin_scope<S>(&self, _state: &S) -> Option<Self::Scope> {
        None
    }
}

impl std::fmt::Debug for DbLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbLogger")
            .field("category", &self.category)
            .field("log_table", &self.options.log_table)
            .field("connector", &"<Connector>")
            .finish()
    }
}

fn assign(slot: &mut String, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !is_blank(v)) {
        *slot = value.to_string();
    }
}

/// Numeric id of the calling thread.
///
/// `ThreadId` only exposes its number through `Debug` (`ThreadId(7)`) on
/// stable Rust.
pub(crate) fn current_thread_id() -> String {
    let raw = format!("{:?}", std::thread::current().id());
    raw.trim_start_matches("ThreadId(")
        .trim_end_matches(')')
        .to_string()
}
