//! Stdio transport

use crate::server::GitLabMcpHandler;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing::info;

/// Serve one session over stdin/stdout until the client disconnects
pub async fn run_stdio(handler: GitLabMcpHandler) -> anyhow::Result<()> {
    info!("Starting GitLab MCP server with stdio transport");

    let server = handler.serve(stdio()).await?;
    server.waiting().await?;

    info!("GitLab MCP server stopped");
    Ok(())
}
