//! Configuration types for gitlab-mcp
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::Deserialize;

use crate::catalog::SchemaMode;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// GitLab connection settings
    pub gitlab: GitLabConfig,

    /// Server/transport settings
    pub server: ServerConfig,

    /// Catalog filtering
    pub tools: ToolsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// GitLab connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// GitLab instance URL, with or without the `/api/v4` suffix
    pub url: String,

    /// Personal Access Token (prefer env var GITLAB_TOKEN)
    pub token: Option<String>,

    /// Netscape cookie file used instead of a token
    pub auth_cookie_path: Option<String>,

    /// API version (default: "v4")
    pub api_version: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Accept invalid TLS certificates
    pub skip_tls_verify: bool,

    /// Extra PEM CA bundle
    pub ca_cert_path: Option<String>,

    /// Explicit proxy URL; otherwise the usual HTTP(S)_PROXY variables apply
    pub proxy: Option<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            url: "https://gitlab.com".to_string(),
            token: None,
            auth_cookie_path: None,
            api_version: "v4".to_string(),
            timeout_ms: 20_000,
            skip_tls_verify: false,
            ca_cert_path: None,
            proxy: None,
        }
    }
}

impl GitLabConfig {
    /// Instance root without any `/api/...` suffix
    pub fn instance_url(&self) -> String {
        let url = self.url.trim_end_matches('/');
        match url.rfind("/api/v") {
            Some(idx) if url[idx + "/api/v".len()..].chars().all(|c| c.is_ascii_digit()) => {
                url[..idx].to_string()
            }
            _ => url.to_string(),
        }
    }

    /// Full REST API base URL
    pub fn api_url(&self) -> String {
        let url = self.url.trim_end_matches('/');
        if url != self.instance_url() {
            url.to_string()
        } else {
            format!("{}/api/{}", url, self.api_version)
        }
    }

    /// GraphQL endpoint
    pub fn graphql_url(&self) -> String {
        format!("{}/api/graphql", self.instance_url())
    }
}

/// Server/transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Transport mode
    pub transport: TransportMode,

    /// HTTP host (for http transport)
    pub host: String,

    /// HTTP port (for http transport)
    pub port: u16,

    /// Server name for MCP
    pub name: String,

    /// Server version for MCP
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::Stdio,
            host: "127.0.0.1".to_string(),
            port: 3002,
            name: "gitlab-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Transport mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Standard input/output (default)
    #[default]
    Stdio,
    /// Streamable HTTP under `/mcp`
    Http,
}

/// Which tools and actions are exposed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Hide and reject every mutating operation
    pub read_only: bool,

    /// Only these tools (empty = all)
    pub allowed_tools: Vec<String>,

    /// Tools whose names match are removed; an invalid regex is ignored
    pub denied_tools_regex: Option<String>,

    /// `tool:action` pairs that are removed
    pub denied_actions: Vec<String>,

    /// Active profile or preset name
    pub profile: Option<String>,

    /// User profiles file (default `~/.config/gitlab-mcp/profiles.toml`)
    pub profiles_path: Option<String>,

    /// `free`, `premium`, `ultimate`; unset means detect from the instance
    pub tier: Option<String>,

    /// Input schema presentation for action-based tools
    pub schema_mode: SchemaMode,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
