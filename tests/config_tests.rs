//! Configuration and profile loading

use gitlab_mcp::catalog::{CatalogMetadata, Entity, GateValues, SchemaMode};
use gitlab_mcp::config::{
    LogFormat, ProfileKind, ProfileSet, TransportMode, build_policy, load_config,
    load_config_from_str, load_config_with_env,
};
use gitlab_mcp::error::ConfigError;
use gitlab_mcp::tools::RegistryManager;
use serial_test::serial;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

const FULL_CONFIG: &str = r#"
[server]
name = "gitlab-mcp-test"
transport = "http"
host = "0.0.0.0"
port = 9000

[gitlab]
url = "https://gitlab.company.com/api/v4"
token = "glpat-test"
timeout_ms = 7500
skip_tls_verify = true

[tools]
read_only = false
allowed_tools = ["browse_projects", "browse_refs"]
denied_tools_regex = "^manage_"
schema_mode = "flat"
profile = "developer"

[logging]
level = "debug"
format = "json"
"#;

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    assert_eq!(config.server.transport, TransportMode::Http);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.gitlab.instance_url(), "https://gitlab.company.com");
    assert_eq!(config.gitlab.api_url(), "https://gitlab.company.com/api/v4");
    assert_eq!(
        config.gitlab.graphql_url(),
        "https://gitlab.company.com/api/graphql"
    );
    assert_eq!(config.gitlab.timeout_ms, 7500);
    assert!(config.gitlab.skip_tls_verify);
    assert_eq!(config.tools.allowed_tools.len(), 2);
    assert_eq!(config.tools.schema_mode, SchemaMode::Flat);
    assert_eq!(config.tools.profile.as_deref(), Some("developer"));
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_defaults() {
    let config = load_config_from_str("").unwrap();

    assert_eq!(config.server.transport, TransportMode::Stdio);
    assert_eq!(config.gitlab.api_url(), "https://gitlab.com/api/v4");
    assert_eq!(config.gitlab.timeout_ms, 20_000);
    assert!(!config.tools.read_only);
    assert!(config.tools.tier.is_none());
    assert_eq!(config.tools.schema_mode, SchemaMode::Discriminated);
}

#[test]
fn test_config_file_then_env() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[gitlab]\nurl = \"https://from-file.example.com\"\ntimeout_ms = 1000").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let from_file = load_config_with_env(Some(&path), HashMap::new()).unwrap();
    assert_eq!(from_file.gitlab.url, "https://from-file.example.com");

    let env = HashMap::from([
        ("GITLAB_API_URL".to_string(), "https://from-env.example.com".to_string()),
        ("GITLAB_MCP__SERVER__PORT".to_string(), "4000".to_string()),
    ]);
    let overridden = load_config_with_env(Some(&path), env).unwrap();
    assert_eq!(overridden.gitlab.url, "https://from-env.example.com");
    assert_eq!(overridden.gitlab.timeout_ms, 1000);
    assert_eq!(overridden.server.port, 4000);
}

#[test]
fn test_invalid_timeout_env() {
    let env = HashMap::from([("GITLAB_API_TIMEOUT_MS".to_string(), "soon".to_string())]);
    let err = load_config_with_env(None, env).unwrap_err();
    assert!(err.to_string().contains("GITLAB_API_TIMEOUT_MS"));
}

#[test]
#[serial]
fn test_process_environment() {
    unsafe {
        std::env::set_var("GITLAB_READONLY", "yes");
        std::env::set_var("GITLAB_ALLOWED_TOOLS", "browse_projects,get_users");
    }

    let result = load_config(None);

    unsafe {
        std::env::remove_var("GITLAB_READONLY");
        std::env::remove_var("GITLAB_ALLOWED_TOOLS");
    }

    let config = result.unwrap();
    assert!(config.tools.read_only);
    assert_eq!(config.tools.allowed_tools, vec!["browse_projects", "get_users"]);
}

#[test]
fn test_profiles_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[profiles.ci]
description = "CI bot"
extends = "readonly"
denied_actions = ["browse_files:download"]

[profiles.ci.features]
variables = false
"#
    )
    .unwrap();

    let set = ProfileSet::load(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(set.profile_names().collect::<Vec<_>>(), vec!["ci"]);

    let (kind, ci) = set.resolve("ci").unwrap();
    assert_eq!(kind, ProfileKind::Profile);
    assert_eq!(ci.read_only, Some(true));
    assert_eq!(ci.description.as_deref(), Some("CI bot"));

    let policy = build_policy(
        &load_config_from_str("").unwrap().tools,
        Some(&ci),
        GateValues::default(),
        None,
    );
    let manager = RegistryManager::new(policy);
    let names: Vec<&str> = manager
        .filtered_tool_definitions()
        .iter()
        .map(|t| t.name)
        .collect();

    assert!(names.contains(&"browse_projects"));
    assert!(!names.contains(&"browse_variables"));
    assert!(!names.contains(&"manage_milestone"));
    assert!(
        manager
            .policy()
            .is_action_denied("browse_files", "download")
    );
}

#[test]
fn test_missing_explicit_profiles_file() {
    let result = ProfileSet::load(Some("/nonexistent/profiles.toml"));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_env_gate_overrides_profile_feature() {
    let (_, developer) = ProfileSet::builtin().unwrap().resolve("developer").unwrap();
    let gates = GateValues::from_pairs([("USE_WEBHOOKS", "true")]);
    let policy = build_policy(
        &load_config_from_str("").unwrap().tools,
        Some(&developer),
        gates,
        None,
    );
    let meta = CatalogMetadata::empty();

    assert!(policy.gate_open("list_webhooks", Entity::Webhooks, &meta));
    assert!(!policy.gate_open("list_integrations", Entity::Integrations, &meta));
}
