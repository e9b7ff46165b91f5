//! HTTP service assembly
//!
//! Builds the references router with CORS and request tracing, binds the
//! configured address, and serves until a shutdown signal arrives.

use crate::config::ReffyConfig;
use crate::error::{Error, Result};
use crate::references::{references_router, ReferencesStore, RefsState};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full application router for a store.
pub fn app(store: Arc<ReferencesStore>) -> Router {
    references_router(RefsState { store })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until ctrl-c.
pub async fn run(store: Arc<ReferencesStore>, config: &ReffyConfig) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Server(format!("failed to bind {}: {}", addr, e)))?;

    let local = listener
        .local_addr()
        .map_err(|e| Error::Server(e.to_string()))?;
    tracing::info!("Reffy listening on http://{}", local);

    axum::serve(listener, app(store))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install ctrl-c handler: {}", e);
    }
    tracing::info!("Shutting down...");
}
