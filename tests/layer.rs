use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use pg_entry_log::error::Result;
use pg_entry_log::memory::MemoryConnector;
use pg_entry_log::sink::{Connection, Connector, InsertStatement};
use pg_entry_log::{DbLogLayer, DbLoggerOptions, DbLoggerProvider};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

const ALL_FIELDS: [&str; 8] = [
    "LogLevel",
    "ThreadId",
    "EventId",
    "EventName",
    "Message",
    "ExceptionMessage",
    "ExceptionStackTrace",
    "ExceptionSource",
];

fn provider(fields: &[&str], connector: Arc<dyn Connector>) -> DbLoggerProvider {
    let options = DbLoggerOptions::new("postgres://app@localhost/app", "app_logs", fields.iter().copied())
        .with_record_message(true);
    DbLoggerProvider::new(options, connector)
}

/// Run `f` with a subscriber made of just the database layer.
fn with_layer(layer: DbLogLayer, f: impl FnOnce()) {
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, f);
}

#[derive(Debug)]
struct Timeout;

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("timed out after 5s")
    }
}

impl std::error::Error for Timeout {}

#[derive(Debug)]
struct UploadFailed(Timeout);

impl fmt::Display for UploadFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("upload failed")
    }
}

impl std::error::Error for UploadFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[test]
fn warn_event_becomes_row() {
    let connector = MemoryConnector::new();
    let layer = DbLogLayer::new(provider(&["LogLevel", "Message"], Arc::new(connector.clone())));
    let written = Arc::clone(&layer.written_events);

    with_layer(layer, || {
        tracing::warn!(free_bytes = 1024, "disk low");
    });

    let statements = connector.statements();
    assert_eq!(statements.len(), 1);
    let statement = &statements[0];
    assert_eq!(statement.param("@log_level"), Some("Warning"));
    assert_eq!(statement.param("@message"), Some("disk low"));
    for name in [
        "@thread_id",
        "@event_id",
        "@event_name",
        "@exception_message",
        "@exception_stack_trace",
        "@exception_source",
    ] {
        assert_eq!(statement.param(name), Some(""), "{name}");
    }
    assert_eq!(written.load(Ordering::Relaxed), 1);
}

#[test]
fn event_id_name_and_error_are_captured() {
    let connector = MemoryConnector::new();
    let layer = DbLogLayer::new(provider(&ALL_FIELDS, Arc::new(connector.clone())));

    with_layer(layer, || {
        let err = UploadFailed(Timeout);
        tracing::error!(
            event_id = 4001,
            event_name = "UploadFailed",
            error = &err as &(dyn std::error::Error + 'static),
            "could not upload report"
        );
    });

    let statement = &connector.statements()[0];
    assert_eq!(statement.param("@log_level"), Some("Error"));
    assert_eq!(statement.param("@event_id"), Some("4001"));
    assert_eq!(statement.param("@event_name"), Some("UploadFailed"));
    assert_eq!(statement.param("@message"), Some("could not upload report"));
    assert_eq!(statement.param("@exception_message"), Some("upload failed"));
    assert_eq!(
        statement.param("@exception_stack_trace"),
        Some("caused by: timed out after 5s")
    );
    assert_eq!(statement.param("@exception_source"), Some(module_path!()));
    assert!(!statement.param("@thread_id").unwrap().is_empty());
}

#[test]
fn explicit_exception_fields() {
    let connector = MemoryConnector::new();
    let layer = DbLogLayer::new(provider(&ALL_FIELDS, Arc::new(connector.clone())));

    with_layer(layer, || {
        tracing::error!(
            exception_message = "boom",
            exception_stack_trace = "at X",
            exception_source = "ModuleA",
            "handler crashed"
        );
    });

    let statement = &connector.statements()[0];
    assert_eq!(statement.param("@exception_message"), Some("boom"));
    assert_eq!(statement.param("@exception_stack_trace"), Some("at X"));
    assert_eq!(statement.param("@exception_source"), Some("ModuleA"));
    assert_eq!(statement.param("@event_id"), Some("0"));
    assert_eq!(statement.param("@event_name"), Some(""));
}

#[test]
fn tracing_levels_map_to_level_names() {
    let connector = MemoryConnector::new();
    let layer = DbLogLayer::new(provider(&["LogLevel"], Arc::new(connector.clone())));

    with_layer(layer, || {
        tracing::trace!("t");
        tracing::debug!("d");
        tracing::info!("i");
        tracing::warn!("w");
        tracing::error!("e");
    });

    let levels: Vec<_> = connector
        .statements()
        .iter()
        .map(|s| s.param("@log_level").unwrap().to_string())
        .collect();
    assert_eq!(levels, ["Trace", "Debug", "Information", "Warning", "Error"]);
}

#[test]
fn driver_events_are_skipped() {
    let connector = MemoryConnector::new();
    let layer = DbLogLayer::new(provider(&["Message"], Arc::new(connector.clone())));
    let total = Arc::clone(&layer.total_events);

    with_layer(layer, || {
        tracing::info!(target: "sqlx::query", "INSERT INTO app_logs ...");
        tracing::info!("kept");
    });

    let statements = connector.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].param("@message"), Some("kept"));
    assert_eq!(total.load(Ordering::Relaxed), 2);
}

/// Emits its own tracing event while inserting, like a chatty driver.
struct ChattyConnector(MemoryConnector);

struct ChattyConnection(Box<dyn Connection>);

impl Connector for ChattyConnector {
    fn open(&self, connection_string: &str) -> Result<Box<dyn Connection>> {
        Ok(Box::new(ChattyConnection(self.0.open(connection_string)?)))
    }
}

impl Connection for ChattyConnection {
    fn execute(&mut self, statement: &InsertStatement) -> Result<u64> {
        tracing::debug!(target: "driver", "executing insert");
        self.0.execute(statement)
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.0.close()
    }
}

#[test]
fn events_raised_while_writing_are_dropped() {
    let connector = MemoryConnector::new();
    let layer = DbLogLayer::new(provider(&["Message"], Arc::new(ChattyConnector(connector.clone()))));

    with_layer(layer, || {
        tracing::info!("first");
        tracing::info!("second");
    });

    let messages: Vec<_> = connector
        .statements()
        .iter()
        .map(|s| s.param("@message").unwrap().to_string())
        .collect();
    assert_eq!(messages, ["first", "second"]);
}

#[test]
fn failed_writes_are_counted_and_do_not_panic() {
    let connector = MemoryConnector::new();
    connector.fail_open("connection refused");
    let layer = DbLogLayer::new(provider(&["Message"], Arc::new(connector.clone())));
    let failed = Arc::clone(&layer.failed_events);
    let written = Arc::clone(&layer.written_events);

    with_layer(layer, || {
        tracing::error!("database is down");
    });

    assert_eq!(failed.load(Ordering::Relaxed), 1);
    assert_eq!(written.load(Ordering::Relaxed), 0);
    assert!(connector.statements().is_empty());
}

#[test]
fn concurrent_threads_each_get_their_own_connection() {
    let connector = MemoryConnector::new();
    let layer = DbLogLayer::new(provider(&["ThreadId", "Message"], Arc::new(connector.clone())));
    let dispatch = tracing::Dispatch::new(Registry::default().with(layer));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let dispatch = dispatch.clone();
            std::thread::spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    for i in 0..5 {
                        tracing::info!("worker {} entry {}", worker, i);
                    }
                });
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let statements = connector.statements();
    assert_eq!(statements.len(), 20);
    assert_eq!(connector.opened(), 20);
    assert_eq!(connector.closed(), 20);

    let mut thread_ids: Vec<_> = statements
        .iter()
        .map(|s| s.param("@thread_id").unwrap().to_string())
        .collect();
    thread_ids.sort();
    thread_ids.dedup();
    assert_eq!(thread_ids.len(), 4);

    // Entries from one thread keep their call order.
    for worker in 0..4 {
        let prefix = format!("worker {} ", worker);
        let own: Vec<_> = statements
            .iter()
            .filter_map(|s| s.param("@message"))
            .filter(|m| m.starts_with(&prefix))
            .collect();
        let expected: Vec<_> = (0..5).map(|i| format!("{}entry {}", prefix, i)).collect();
        assert_eq!(own, expected);
    }
}
