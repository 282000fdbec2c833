use crate::error::Result;
use crate::layer::DbLogLayer;
use crate::provider::DbLoggerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Options for installing the database layer as the global subscriber.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added next to [`DbLogLayer`] so events are also printed to the
///   console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { enable_stdout: true }
    }
}

/// Install a global `tracing` subscriber that writes every event through
/// `provider`.
///
/// **Returns**
/// - `Ok(())` once the subscriber is installed.
/// - `Err(DbLoggerError::Init(..))` if a global subscriber already exists.
pub fn init_tracing_with_config(provider: DbLoggerProvider, config: LayerConfig) -> Result<()> {
    let layer = DbLogLayer::new(provider);

    // The two subscriber shapes have different types, so each branch
    // installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Install the Postgres-backed layer with [`LayerConfig::default`].
///
/// This is the recommended entrypoint for typical services:
///
/// ```no_run
/// use pg_entry_log::{init::init_tracing, options::DbLoggerOptions};
///
/// let options = DbLoggerOptions::from_env()?;
/// init_tracing(options)?;
/// tracing::warn!(event_id = 12, event_name = "DiskCheck", "disk low");
/// # Ok::<(), pg_entry_log::error::DbLoggerError>(())
/// ```
#[cfg(feature = "postgres")]
pub fn init_tracing(options: crate::options::DbLoggerOptions) -> Result<()> {
    let provider = DbLoggerProvider::postgres(options)?;
    init_tracing_with_config(provider, LayerConfig::default())
}
