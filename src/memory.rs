use crate::error::{DbLoggerError, Result};
use crate::sink::{Connection, Connector, InsertStatement};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A connector whose connections accept and drop every statement.
///
/// Useful for measuring the overhead of the logger itself without any
/// database round trips.
#[derive(Clone, Debug, Default)]
pub struct NoopConnector;

struct NoopConnection;

impl Connector for NoopConnector {
    fn open(&self, _connection_string: &str) -> Result<Box<dyn Connection>> {
        Ok(Box::new(NoopConnection))
    }
}

impl Connection for NoopConnection {
    fn execute(&mut self, _statement: &InsertStatement) -> Result<u64> {
        Ok(1)
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// A connector that keeps every executed statement in memory.
///
/// Clones share the same storage, so a test can hand one clone to the
/// provider and inspect another. Connections can be told to fail on open or
/// on execute to exercise error paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryConnector {
    state: Arc<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    statements: Mutex<Vec<InsertStatement>>,
    connection_strings: Mutex<Vec<String>>,
    opened: AtomicU64,
    closed: AtomicU64,
    fail_open: Mutex<Option<String>>,
    fail_execute: Mutex<Option<String>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `open` fail with `reason`.
    pub fn fail_open(&self, reason: impl Into<String>) {
        *lock(&self.state.fail_open) = Some(reason.into());
    }

    /// Make every later `execute` fail with `reason`.
    pub fn fail_execute(&self, reason: impl Into<String>) {
        *lock(&self.state.fail_execute) = Some(reason.into());
    }

    /// Statements executed so far, in execution order.
    pub fn statements(&self) -> Vec<InsertStatement> {
        lock(&self.state.statements).clone()
    }

    /// Connection strings passed to `open`, in call order.
    pub fn connection_strings(&self) -> Vec<String> {
        lock(&self.state.connection_strings).clone()
    }

    pub fn opened(&self) -> u64 {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> u64 {
        self.state.closed.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryConnector {
    fn open(&self, connection_string: &str) -> Result<Box<dyn Connection>> {
        lock(&self.state.connection_strings).push(connection_string.to_string());
        if let Some(reason) = lock(&self.state.fail_open).clone() {
            return Err(DbLoggerError::Connect(reason.into()));
        }

        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            state: Arc::clone(&self.state),
            released: false,
        }))
    }
}

struct MemoryConnection {
    state: Arc<MemoryState>,
    released: bool,
}

impl MemoryConnection {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Connection for MemoryConnection {
    fn execute(&mut self, statement: &InsertStatement) -> Result<u64> {
        if let Some(reason) = lock(&self.state.fail_execute).clone() {
            return Err(DbLoggerError::Execute(reason.into()));
        }
        lock(&self.state.statements).push(statement.clone());
        Ok(1)
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.release();
    }
}

// A panic while holding one of these locks only loses test bookkeeping.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DbLoggerOptions;
    use crate::record::LogRow;

    fn statement() -> InsertStatement {
        let options = DbLoggerOptions::new("postgres://x", "logs", Vec::<String>::new());
        InsertStatement::for_row(&options, &LogRow::empty(chrono::Local::now()))
    }

    #[test]
    fn noop_accepts_everything() {
        let mut conn = NoopConnector.open("anything").unwrap();
        assert_eq!(conn.execute(&statement()).unwrap(), 1);
        conn.close().unwrap();
    }

    #[test]
    fn dropped_connection_counts_as_closed_once() {
        let connector = MemoryConnector::new();
        let conn = connector.open("postgres://x").unwrap();
        drop(conn);
        let conn = connector.open("postgres://x").unwrap();
        conn.close().unwrap();

        assert_eq!(connector.opened(), 2);
        assert_eq!(connector.closed(), 2);
    }
}
