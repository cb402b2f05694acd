//! filestream-server: HTTP surface for range-streamed media objects.
//!
//! This crate ties the lookup store and the upstream source together into
//! a running server. It provides:
//!
//! - Range parsing, metadata resolution, and response header construction
//! - A lazy, budget-exact chunk stream driver feeding response bodies
//! - Axum routes for liveness, file metadata, and inline/attachment streams
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod store;
pub mod streaming;

use std::net::SocketAddr;
use std::sync::Arc;

use filestream_core::config::Config;
use filestream_core::Error;

use crate::context::AppContext;
use crate::store::SqliteLookupStore;

/// Start the filestream server.
///
/// Opens the lookup database, builds the upstream source named by the
/// configuration, and serves HTTP until a shutdown signal arrives.
pub async fn start(config: Config) -> filestream_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    // Initialize database.
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = filestream_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    let source = filestream_upstream::from_config(&config.upstream)
        .map_err(|e| Error::Upstream(format!("Failed to build upstream source: {e}")))?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Validation(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config, Arc::new(SqliteLookupStore::new(db)), source);
    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
