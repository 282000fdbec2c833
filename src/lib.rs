pub mod error;
pub mod record;
pub mod field;
pub mod options;
pub mod sink;
pub mod logger;
pub mod provider;
pub mod layer;

#[cfg(feature = "postgres")]
pub mod postgres;

pub mod env;
pub mod init;
pub mod memory;

pub use error::DbLoggerError;
pub use layer::DbLogLayer;
pub use logger::{DbLogger, Logger};
pub use options::DbLoggerOptions;
pub use provider::DbLoggerProvider;
