/// Error type returned by [`DbLogger::log`](crate::logger::DbLogger) and the
/// connectors behind it.
///
/// Nothing in this crate retries; every variant is handed straight back to
/// the caller.
#[derive(thiserror::Error, Debug)]
pub enum DbLoggerError {
    #[error("failed to open database connection: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to insert log row: {0}")]
    Execute(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to close database connection: {0}")]
    Close(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to build blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("invalid logger configuration: {0}")]
    Config(String),

    #[error("invalid logger configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub type Result<T> = std::result::Result<T, DbLoggerError>;
