//! Command line interface
//!
//! Subcommands:
//! - `serve`: run the MCP server (default when no subcommand is given)
//! - `list-tools`: inspect the tool catalog without starting a server

mod list_tools;
mod serve;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::{AppConfig, TransportMode};
use crate::error::ConfigError;

pub use list_tools::{ListToolsArgs, OutputFormat};
pub use serve::ServeArgs;

/// gitlab-mcp - GitLab tools for MCP clients
#[derive(Parser, Debug)]
#[command(name = "gitlab-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "GITLAB_MCP_CONFIG", global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GITLAB_MCP_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the MCP server
    Serve(ServeArgs),

    /// Print the tool catalog as the current configuration exposes it
    ListTools(ListToolsArgs),
}

/// Errors reported by CLI commands; every one exits with status 1
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("{0} problem(s) found in presets and profiles")]
    Validation(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl Cli {
    /// The command to run, `serve` when none was given
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    }

    /// Apply flags that override configuration values
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.log_json {
            config.logging.format = crate::config::LogFormat::Json;
        }
        if let Some(Command::Serve(args)) = &self.command {
            args.apply(config);
        }
    }
}

impl ServeArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(transport) = self.transport {
            config.server.transport = transport;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

/// Transport names accepted on the command line
pub(crate) fn parse_transport(raw: &str) -> Result<TransportMode, String> {
    match raw.to_ascii_lowercase().as_str() {
        "stdio" => Ok(TransportMode::Stdio),
        "http" | "streamable-http" => Ok(TransportMode::Http),
        other => Err(format!("unknown transport '{}' (expected stdio or http)", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::try_parse_from(["gitlab-mcp"]).unwrap();
        assert!(matches!(cli.command(), Command::Serve(_)));
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "gitlab-mcp",
            "--log-level",
            "debug",
            "serve",
            "--transport",
            "http",
            "--port",
            "9000",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.transport, TransportMode::Http);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_unknown_transport_rejected() {
        assert!(Cli::try_parse_from(["gitlab-mcp", "serve", "--transport", "sse"]).is_err());
        assert_eq!(parse_transport("Streamable-HTTP"), Ok(TransportMode::Http));
    }

    #[test]
    fn test_list_tools_flags_parse() {
        let cli = Cli::try_parse_from([
            "gitlab-mcp",
            "list-tools",
            "--preset",
            "readonly",
            "--json",
        ])
        .unwrap();
        let Command::ListTools(args) = cli.command() else {
            panic!("expected list-tools");
        };
        assert_eq!(args.preset.as_deref(), Some("readonly"));
        assert!(args.json);
    }
}
