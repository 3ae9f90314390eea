//! Shared helpers for integration tests

#![allow(dead_code)]

use gitlab_mcp::auth::PatProvider;
use gitlab_mcp::config::GitLabConfig;
use gitlab_mcp::gitlab::GitLabClient;
use gitlab_mcp::tools::ToolContext;
use std::sync::Arc;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

/// Client pointed at the mock server
pub fn client_for(server: &MockServer) -> Arc<GitLabClient> {
    client_with_timeout(server, 5_000)
}

pub fn client_with_timeout(server: &MockServer, timeout_ms: u64) -> Arc<GitLabClient> {
    let config = GitLabConfig {
        url: server.uri(),
        token: Some(TOKEN.to_string()),
        timeout_ms,
        ..Default::default()
    };
    let auth = PatProvider::new(TOKEN).unwrap();
    Arc::new(GitLabClient::new(&config, Box::new(auth)).unwrap())
}

/// Client for tests that never reach the network
pub fn offline_client() -> Arc<GitLabClient> {
    let config = GitLabConfig {
        url: "http://127.0.0.1:9".to_string(),
        token: Some(TOKEN.to_string()),
        timeout_ms: 500,
        ..Default::default()
    };
    let auth = PatProvider::new(TOKEN).unwrap();
    Arc::new(GitLabClient::new(&config, Box::new(auth)).unwrap())
}

pub fn context(client: Arc<GitLabClient>) -> ToolContext {
    ToolContext::new(client, "test-request")
}
