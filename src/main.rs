//! Chat Relay Server - Binary Entry Point

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use chat_relay::api::http::create_router;
use chat_relay::logging::init_tracing;
use chat_relay::types::ChatResult;
use chat_relay::{AppState, CredentialStore, ServerConfig};

#[tokio::main]
async fn main() -> ChatResult<()> {
    init_tracing();

    let config = ServerConfig::from_env()?;
    let credentials = CredentialStore::open(&config.db_path, config.bcrypt_cost)?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(config, credentials));
    let app = create_router(Arc::clone(&state));

    let listener = TcpListener::bind(addr).await?;
    info!("Server running on port {}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        connections = state.hub().connection_count(),
        "Server stopped, dropping relay state"
    );
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
