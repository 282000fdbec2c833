use crate::logger::DbLogger;
use crate::options::DbLoggerOptions;
use crate::sink::Connector;
use std::sync::Arc;

/// Creates [`DbLogger`]s that share one set of options and one connector.
#[derive(Clone)]
pub struct DbLoggerProvider {
    options: Arc<DbLoggerOptions>,
    connector: Arc<dyn Connector>,
}

impl DbLoggerProvider {
    /// Name under which this provider is registered in host configuration.
    pub const ALIAS: &'static str = "Database";

    pub fn new(options: DbLoggerOptions, connector: Arc<dyn Connector>) -> Self {
        Self::with_shared_options(Arc::new(options), connector)
    }

    pub fn with_shared_options(options: Arc<DbLoggerOptions>, connector: Arc<dyn Connector>) -> Self {
        Self { options, connector }
    }

    /// Provider backed by [`PgConnector`](crate::postgres::PgConnector).
    #[cfg(feature = "postgres")]
    pub fn postgres(options: DbLoggerOptions) -> crate::error::Result<Self> {
        let connector = crate::postgres::PgConnector::new()?;
        Ok(Self::new(options, Arc::new(connector)))
    }

    pub fn options(&self) -> &Arc<DbLoggerOptions> {
        &self.options
    }

    /// Create the logger for a category. Loggers are cheap; the category is
    /// carried for diagnostics only.
    pub fn create_logger(&self, category: &str) -> DbLogger {
        DbLogger::new(category, Arc::clone(&self.options), Arc::clone(&self.connector))
    }
}
