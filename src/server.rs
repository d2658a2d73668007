//! Server Startup
//!
//! Runs the scoring API over HTTP for a caller-supplied [`ScoringService`].
//!
//! # Startup Sequence
//! 1. Create the in-memory store, coordinator and cached scoring bindings
//! 2. Start the background expiry sweeper
//! 3. Create the Axum router with all endpoints
//! 4. Serve until the shutdown future resolves
//! 5. Drain background cache work and close the store

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::scoring::ScoringService;
use crate::tasks::spawn_expiry_sweeper;

/// Binds `0.0.0.0:{server_port}` and serves until Ctrl+C or SIGTERM.
pub async fn serve(config: Config, service: Arc<dyn ScoringService>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    serve_on(listener, &config, service, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve_on<S>(
    listener: TcpListener,
    config: &Config,
    service: Arc<dyn ScoringService>,
    shutdown: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    info!(
        "Configuration loaded: env={}, cache_ttl={}s, jitter={}s, max_entries={}, request_timeout={}s",
        config.app_env, config.cache_ttl, config.ttl_jitter, config.max_entries, config.request_timeout
    );

    let state = AppState::from_config(config, service);
    let coordinator = state.coordinator().clone();

    let sweeper = state
        .store
        .clone()
        .map(|store| spawn_expiry_sweeper(store, config.cleanup_interval));

    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    if let Err(err) = coordinator.shutdown().await {
        warn!(error = %err, "failed to close cache store");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
