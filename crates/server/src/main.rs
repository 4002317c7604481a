//! stackpager server entry point.
//!
//! Boots the HTTP server. Logging goes to stderr as JSON.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use stackpager_client::{StackClient, StackConfig};
use stackpager_core::{AppConfig, SessionDb, SiteCatalog};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod query;
mod routes;
#[cfg(test)]
mod testing;
mod throttle;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;

    let sessions = SessionDb::open(&config.db_path, config.session_ttl_secs)
        .await
        .with_context(|| format!("opening session database {}", config.db_path.display()))?;

    let catalog = match &config.site_catalog_path {
        Some(path) => SiteCatalog::load(path, config.site_catalog_limit)?,
        None => SiteCatalog::builtin(),
    };

    let client = StackClient::new(StackConfig::from(&config))?;

    let state = handler::AppState {
        sessions,
        source: Arc::new(client),
        catalog: Arc::new(catalog),
        session_ttl_secs: config.session_ttl_secs,
    };
    let throttle =
        throttle::ThrottleState::new(config.throttle_per_minute, config.throttle_per_hour, config.trust_proxy_headers);

    spawn_purge(state.sessions.clone(), throttle.clone(), config.purge_interval());

    let app = handler::router(state, throttle);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "Starting stackpager server");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodically delete expired sessions and idle throttle entries.
fn spawn_purge(sessions: SessionDb, throttle: throttle::ThrottleState, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "purged expired sessions"),
                Err(e) => tracing::warn!("session purge failed: {}", e),
            }
            let pruned = throttle.prune();
            if pruned > 0 {
                tracing::debug!(pruned, "pruned idle throttle entries");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
