use std::sync::Arc;

use pg_entry_log::{
    error::Result,
    init::{init_tracing_with_config, LayerConfig},
    sink::{Connection, Connector, InsertStatement},
    DbLoggerOptions, DbLoggerProvider,
};
use tracing::{error, info};

/// Example of plugging in a completely custom database client by
/// implementing the `Connector` trait directly. Imagine this talks to
/// some proprietary DB for which this crate does not provide a built-in
/// connector.
struct PrintConnector;

struct PrintConnection;

impl Connector for PrintConnector {
    fn open(&self, connection_string: &str) -> Result<Box<dyn Connection>> {
        println!("[my-custom-db] open {}", connection_string);
        Ok(Box::new(PrintConnection))
    }
}

impl Connection for PrintConnection {
    fn execute(&mut self, statement: &InsertStatement) -> Result<u64> {
        // Here you would call your own client library for the target DB.
        // For the sake of example we just print the statement.
        println!("[my-custom-db] {} @ {} {:?}", statement.sql, statement.date, statement.text_params);
        Ok(1)
    }

    fn close(self: Box<Self>) -> Result<()> {
        println!("[my-custom-db] close");
        Ok(())
    }
}

fn main() -> Result<()> {
    let options = DbLoggerOptions::from_json_str(
        r#"{
            "ConnectionString": "mydb://localhost/app",
            "LogTable": "app_logs",
            "LogFields": ["LogLevel", "EventId", "Message"],
            "RecordMessage": true
        }"#,
    )?;
    let provider = DbLoggerProvider::new(options, Arc::new(PrintConnector));

    init_tracing_with_config(provider, LayerConfig { enable_stdout: false })?;

    info!(event_id = 7, "custom connector example started");
    error!(db = "my-custom-db", "simulated error sent via custom connector");
    Ok(())
}
