use crate::env::{
    parse_flag, split_fields, DB_LOGGER_CONNECTION_STRING_ENV, DB_LOGGER_FIELDS_ENV,
    DB_LOGGER_RECORD_MESSAGE_ENV, DB_LOGGER_TABLE_ENV, DEFAULT_LOG_TABLE,
};
use crate::error::{DbLoggerError, Result};
use crate::field::LogField;
use serde::Deserialize;

/// Settings shared by every [`DbLogger`](crate::logger::DbLogger).
///
/// Built once at startup and then only read, usually behind an `Arc`.
///
/// **Fields**
/// - `connection_string`: handed unchanged to the connector on every call.
/// - `log_table`: destination table. It is placed into the statement text
///   verbatim, without quoting or escaping, so it must come from trusted
///   configuration.
/// - `log_fields`: names of the columns to fill, in order. Unknown names are
///   kept here but ignored when rows are built.
/// - `record_message`: also write the formatted message into a `message`
///   column. Off by default to match the established table layout.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DbLoggerOptions {
    #[serde(alias = "connection_string")]
    pub connection_string: String,
    #[serde(alias = "log_table")]
    pub log_table: String,
    #[serde(default, alias = "log_fields")]
    pub log_fields: Vec<String>,
    #[serde(default, alias = "record_message")]
    pub record_message: bool,
}

impl DbLoggerOptions {
    pub fn new<I, S>(connection_string: impl Into<String>, log_table: impl Into<String>, log_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            connection_string: connection_string.into(),
            log_table: log_table.into(),
            log_fields: log_fields.into_iter().map(Into::into).collect(),
            record_message: false,
        }
    }

    pub fn with_record_message(mut self, record_message: bool) -> Self {
        self.record_message = record_message;
        self
    }

    /// Recognized fields in configured order. Unknown names are skipped.
    pub fn fields(&self) -> impl Iterator<Item = LogField> + '_ {
        self.log_fields.iter().filter_map(|name| name.parse().ok())
    }

    /// Parse options from a JSON settings section such as
    /// `{"ConnectionString": "...", "LogTable": "logs", "LogFields": ["LogLevel"]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build options from the `DB_LOGGER_*` environment variables.
    ///
    /// Only the connection string is required; the table defaults to
    /// [`DEFAULT_LOG_TABLE`] and the field list to empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connection_string = lookup(DB_LOGGER_CONNECTION_STRING_ENV).ok_or_else(|| {
            DbLoggerError::Config(format!("{} is not set", DB_LOGGER_CONNECTION_STRING_ENV))
        })?;
        let log_table = lookup(DB_LOGGER_TABLE_ENV).unwrap_or_else(|| DEFAULT_LOG_TABLE.to_string());
        let log_fields = lookup(DB_LOGGER_FIELDS_ENV)
            .map(|raw| split_fields(&raw))
            .unwrap_or_default();
        let record_message = lookup(DB_LOGGER_RECORD_MESSAGE_ENV)
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);

        Ok(Self {
            connection_string,
            log_table,
            log_fields,
            record_message,
        })
    }
}
