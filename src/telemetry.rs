//! Logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "readthrough=info,tower_http=info";

/// Installs the global tracing subscriber.
///
/// Development output is colored and compact; production output drops ANSI
/// codes and keeps the target so log shippers can route on it.
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let fmt_layer = if config.is_production() {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .compact()
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}
