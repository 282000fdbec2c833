use std::fmt;
use std::str::FromStr;

/// Columns that can be selected through `log_fields`.
///
/// The set is closed: names outside it fail to parse and are skipped by the
/// logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogField {
    LogLevel,
    ThreadId,
    EventId,
    EventName,
    Message,
    ExceptionMessage,
    ExceptionStackTrace,
    ExceptionSource,
}

impl LogField {
    pub const ALL: [LogField; 8] = [
        LogField::LogLevel,
        LogField::ThreadId,
        LogField::EventId,
        LogField::EventName,
        LogField::Message,
        LogField::ExceptionMessage,
        LogField::ExceptionStackTrace,
        LogField::ExceptionSource,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LogField::LogLevel => "LogLevel",
            LogField::ThreadId => "ThreadId",
            LogField::EventId => "EventId",
            LogField::EventName => "EventName",
            LogField::Message => "Message",
            LogField::ExceptionMessage => "ExceptionMessage",
            LogField::ExceptionStackTrace => "ExceptionStackTrace",
            LogField::ExceptionSource => "ExceptionSource",
        }
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown log field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for LogField {
    type Err = UnknownField;

    // Names are matched exactly, including case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
