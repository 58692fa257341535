//! HTTP surface.
//!
//! Two endpoints:
//! - `POST /api/analyze` - streaming batch audit (`LOG:`/`RESULT:`/`GLOBAL_RESULT:`/`ERROR:` lines)
//! - `GET /api/sitemap?url=` - sitemap discovery

mod handlers;

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};

use crate::audit_engine::BatchOrchestrator;
use crate::sitemap::SitemapDiscovery;

pub use handlers::{analyze_handler, sitemap_handler};

/// Shared state for the HTTP handlers
#[derive(Debug, Clone)]
pub struct ServerState {
    pub orchestrator: BatchOrchestrator,
    pub sitemaps: SitemapDiscovery,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/api/sitemap", get(sitemap_handler))
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves or the server fails.
pub async fn serve<F>(addr: SocketAddr, state: ServerState, shutdown: F) -> Result<(), anyhow::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind server to {addr}: {e}"))?;

    log::info!("Site audit server listening on http://{addr}/");
    log::info!("  - Analyze: POST http://{addr}/api/analyze");
    log::info!("  - Sitemap: GET  http://{addr}/api/sitemap?url=<domain>");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;

    Ok(())
}
