//! `serve` command: run the consent HTTP service

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::consent::session::SessionStore;
use crate::error::{ConsentError, Result};
use crate::oauth::api::HttpAuthorizationServer;
use crate::server::{router, AppState};

/// Bind the configured address and serve until Ctrl-C.
///
/// # Errors
///
/// Returns error if no credential is configured, the HTTP client cannot be
/// built, or the listen address cannot be bound.
pub async fn run_serve(config: Config) -> Result<()> {
    config.require_credential()?;

    let server = HttpAuthorizationServer::new(&config.authorization_server)?;
    let sessions = SessionStore::new(
        Duration::from_secs(config.server.session_ttl_seconds),
        config.server.max_sessions,
    );
    let app = router(AppState::new(Arc::new(server), sessions));

    let listener = TcpListener::bind(config.server.bind_address.as_str())
        .await
        .map_err(|e| {
            ConsentError::Config(format!(
                "Failed to bind {}: {}",
                config.server.bind_address, e
            ))
        })?;

    tracing::info!(
        bind_address = %config.server.bind_address,
        authorization_server = %config.authorization_server.base_url,
        "Consent service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Consent service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
