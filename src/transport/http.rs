//! Streamable HTTP transport
//!
//! Serves MCP under `/mcp` with one session per client. Every session gets a
//! clone of the same handler, so the catalog and GitLab client are shared.

use crate::error::TransportError;
use crate::server::GitLabMcpHandler;
use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Default port for the HTTP transport
pub const DEFAULT_HTTP_PORT: u16 = 3002;

/// Route the MCP service is mounted on
pub const MCP_PATH: &str = "/mcp";

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
        }
    }
}

impl HttpConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Parse `host:port`; IPv6 hosts may be given with or without brackets
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, TransportError> {
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let raw = if host.contains(':') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        };
        let bind = raw
            .parse()
            .map_err(|_| TransportError::InvalidAddress(raw.clone()))?;
        Ok(Self::new(bind))
    }
}

/// Axum router exposing the handler under [`MCP_PATH`]
pub fn router(handler: GitLabMcpHandler) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .nest_service(MCP_PATH, service)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl+C
pub async fn run_http(handler: GitLabMcpHandler, config: HttpConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(TransportError::Io)?;
    let local = listener.local_addr().map_err(TransportError::Io)?;

    info!(
        address = %local,
        "Starting GitLab MCP server with streamable HTTP transport at http://{}{}",
        local,
        MCP_PATH
    );

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await
        .map_err(TransportError::Io)?;

    info!("HTTP server stopped");
    Ok(())
}
