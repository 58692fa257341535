// Category HTTP Server: Site Audit
//
// Serves the streaming batch audit and sitemap discovery endpoints.
// Binds SITEAUDIT_HOST:SITEAUDIT_PORT, 127.0.0.1:3000 by default.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use kodegen_tools_siteaudit::analyzers::http_client;
use kodegen_tools_siteaudit::server::{ServerState, serve};
use kodegen_tools_siteaudit::{AuditConfig, BatchOrchestrator, SitemapDiscovery};
use tracing_subscriber::EnvFilter;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

fn bind_address() -> Result<SocketAddr> {
    let host = std::env::var("SITEAUDIT_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = match std::env::var("SITEAUDIT_PORT") {
        Ok(raw) => raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("SITEAUDIT_PORT is not a port number: {raw}"))?,
        Err(_) => DEFAULT_PORT,
    };
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid bind address {host}:{port}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AuditConfig::from_env().context("Invalid SITEAUDIT_* configuration")?;
    tracing::info!(
        "Browser engine: {:?}, context strategy: {:?}",
        config.browser_engine(),
        config.context_strategy()
    );

    let state = ServerState {
        orchestrator: BatchOrchestrator::new(config),
        sitemaps: SitemapDiscovery::new(http_client()?),
    };

    serve(bind_address()?, state, shutdown_signal()).await
}
