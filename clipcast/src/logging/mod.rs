//! Tracing subscriber initialization.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "clipcast=info,platform_publishers=info,sqlx=warn";

/// Initialize the global tracing subscriber.
///
/// An explicit `filter` wins over `RUST_LOG`; both fall back to
/// [`DEFAULT_LOG_FILTER`].
pub fn init_logging(filter: Option<&str>) -> crate::Result<()> {
    let env_filter = match filter {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| crate::Error::config(format!("Invalid log filter directive: {e}")))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {e}"))
        })?;

    Ok(())
}
