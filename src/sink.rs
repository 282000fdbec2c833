use crate::error::Result;
use crate::options::DbLoggerOptions;
use crate::record::LogRow;
use chrono::{DateTime, Local};

/// Column list shared by every insert, in bind order after `date`.
pub const COLUMNS: [&str; 8] = [
    "date",
    "thread_id",
    "log_level",
    "event_id",
    "event_name",
    "exception_message",
    "exception_stack_trace",
    "exception_source",
];

/// Names of the bound parameters, positionally matching [`COLUMNS`].
pub const PARAMETER_NAMES: [&str; 8] = [
    "@date",
    "@thread_id",
    "@log_level",
    "@event_id",
    "@event_name",
    "@exception_message",
    "@exception_stack_trace",
    "@exception_source",
];

/// A ready-to-run insert: statement text plus its bound values.
///
/// `$1` is always the timestamp; `$2..` are text values, in the same order
/// as `text_params`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub sql: String,
    pub date: DateTime<Local>,
    pub text_params: Vec<(&'static str, String)>,
}

impl InsertStatement {
    /// Build the insert for `row` into the table configured in `options`.
    ///
    /// The table name is formatted into the statement text unescaped.
    pub fn for_row(options: &DbLoggerOptions, row: &LogRow) -> Self {
        let mut columns = COLUMNS.join(", ");
        let mut placeholders = (1..=COLUMNS.len())
            .map(|n| format!("${}", n))
            .collect::<Vec<_>>()
            .join(", ");

        let mut text_params = vec![
            ("@thread_id", row.thread_id.clone()),
            ("@log_level", row.log_level.clone()),
            ("@event_id", row.event_id.clone()),
            ("@event_name", row.event_name.clone()),
            ("@exception_message", row.exception_message.clone()),
            ("@exception_stack_trace", row.exception_stack_trace.clone()),
            ("@exception_source", row.exception_source.clone()),
        ];

        if options.record_message {
            columns.push_str(", message");
            placeholders.push_str(&format!(", ${}", COLUMNS.len() + 1));
            text_params.push(("@message", row.message.clone()));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            options.log_table, columns, placeholders
        );

        Self {
            sql,
            date: row.date,
            text_params,
        }
    }

    /// Value bound for a parameter name such as `"@log_level"`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.text_params
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Opens connections to the log database.
///
/// The logger calls [`Connector::open`] once per log entry and drops the
/// connection before returning, so any pooling belongs inside the
/// implementation.
pub trait Connector: Send + Sync {
    /// Open a connection.
    ///
    /// **Parameters**
    /// - `connection_string`: taken verbatim from
    ///   [`DbLoggerOptions::connection_string`].
    ///
    /// **Returns**
    /// - `Ok(conn)` ready to execute a statement.
    /// - `Err(DbLoggerError::Connect(..))` if the database is unreachable or
    ///   the string is malformed.
    fn open(&self, connection_string: &str) -> Result<Box<dyn Connection>>;
}

/// A single open connection, owned by exactly one log call.
pub trait Connection: Send {
    /// Execute one insert and return the number of affected rows.
    fn execute(&mut self, statement: &InsertStatement) -> Result<u64>;

    /// Close the connection. Called on both the success and failure path.
    ///
    /// Dropping a connection without calling this must still release it.
    fn close(self: Box<Self>) -> Result<()>;
}
