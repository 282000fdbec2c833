use chrono::{DateTime, Local};
use std::error::Error;
use std::fmt;

/// Severity of a log entry.
///
/// The names match the level strings already stored in existing log tables
/// (`"Information"`, `"Warning"`, ...). `None` is the sentinel that disables
/// logging entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    None,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Critical => "Critical",
            LogLevel::None => "None",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Information,
            tracing::Level::WARN => LogLevel::Warning,
            _ => LogLevel::Error,
        }
    }
}

/// Identifies a logged event: a numeric id and an optional name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventId {
    pub id: i64,
    pub name: Option<String>,
}

impl EventId {
    pub fn new(id: i64) -> Self {
        Self { id, name: None }
    }

    pub fn named(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        EventId::new(id)
    }
}

/// Error attached to a log event.
///
/// Every attribute is optional; an attribute that is missing or blank is
/// never written to the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub message: Option<String>,
    pub stack_trace: Option<String>,
    pub source: Option<String>,
}

impl ExceptionInfo {
    /// Capture an error value.
    ///
    /// The message is the error's `Display` output and the stack trace is its
    /// `source()` chain, one cause per line. `source` names where the error
    /// was observed, usually the module path of the logging call site.
    pub fn from_error(err: &(dyn Error + 'static), source: Option<&str>) -> Self {
        let mut causes = Vec::new();
        let mut cause = err.source();
        while let Some(inner) = cause {
            causes.push(format!("caused by: {}", inner));
            cause = inner.source();
        }

        Self {
            message: Some(err.to_string()),
            stack_trace: if causes.is_empty() {
                None
            } else {
                Some(causes.join("\n"))
            },
            source: source.map(str::to_string),
        }
    }
}

/// A single row destined for the log table.
///
/// String columns that were not selected, or had nothing to record, stay
/// empty strings rather than NULL so the row shape is always the same.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub date: DateTime<Local>,
    pub thread_id: String,
    pub log_level: String,
    pub event_id: String,
    pub event_name: String,
    pub message: String,
    pub exception_message: String,
    pub exception_stack_trace: String,
    pub exception_source: String,
}

impl LogRow {
    /// An empty row stamped with `date`.
    pub fn empty(date: DateTime<Local>) -> Self {
        Self {
            date,
            thread_id: String::new(),
            log_level: String::new(),
            event_id: String::new(),
            event_name: String::new(),
            message: String::new(),
            exception_message: String::new(),
            exception_stack_trace: String::new(),
            exception_source: String::new(),
        }
    }
}

/// Whitespace-only strings count as blank.
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
