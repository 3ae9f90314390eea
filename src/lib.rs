//! GitLab MCP Server
//!
//! A Model Context Protocol server exposing GitLab as a catalog of tools.
//!
//! ## Catalog
//!
//! Tools are grouped by entity (core, milestones, work items, releases,
//! variables, webhooks, refs, integrations, files). Each entity owns a
//! registry; the [`RegistryManager`](tools::RegistryManager) merges them and
//! filters the result:
//!
//! ```text
//! env gates (USE_*) → read-only mode → allow list / deny regex → denied actions → tier
//! ```
//!
//! Most tools are action-based: one tool per entity and intent, with an
//! `action` field selecting the operation (`browse_milestones` with
//! `action = "list"`). Filtering works per action, so a read-only server
//! still lists `manage_integration` with only its `get` action.
//!
//! ## Example Configuration
//!
//! ```toml
//! [gitlab]
//! url = "https://gitlab.example.com"
//! # token from GITLAB_TOKEN env var
//!
//! [tools]
//! read_only = true
//! denied_tools_regex = "^manage_variable$"
//! denied_actions = ["browse_files:download"]
//! profile = "developer"
//! ```

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gitlab;
pub mod server;
pub mod tools;
pub mod transport;
pub mod util;

pub use config::{AppConfig, load_config};
pub use error::{ConfigError, GitLabError, ToolError};
pub use server::GitLabMcpHandler;
pub use tools::RegistryManager;
