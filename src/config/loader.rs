//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Well-known GitLab variables (`GITLAB_API_URL`, `GITLAB_TOKEN`, ...)
//! 2. Prefixed environment variables (`GITLAB_MCP__GITLAB__URL`, ...)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use crate::util::parse_bool;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use std::collections::HashMap;
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "gitlab-mcp.toml",
    ".gitlab-mcp.toml",
    "~/.config/gitlab-mcp/config.toml",
];

/// Plain string variables mapped onto config keys
const STRING_OVERRIDES: &[(&str, &str)] = &[
    ("GITLAB_URL", "gitlab.url"),
    ("GITLAB_API_URL", "gitlab.url"),
    ("GITLAB_PERSONAL_ACCESS_TOKEN", "gitlab.token"),
    ("GITLAB_TOKEN", "gitlab.token"),
    ("GITLAB_AUTH_COOKIE_PATH", "gitlab.auth_cookie_path"),
    ("GITLAB_CA_CERT_PATH", "gitlab.ca_cert_path"),
    ("GITLAB_DENIED_TOOLS_REGEX", "tools.denied_tools_regex"),
    ("GITLAB_PROFILE", "tools.profile"),
    ("GITLAB_PROFILES_PATH", "tools.profiles_path"),
    ("GITLAB_TIER", "tools.tier"),
    ("GITLAB_SCHEMA_MODE", "tools.schema_mode"),
];

/// Boolean variables mapped onto config keys
const BOOL_OVERRIDES: &[(&str, &str)] = &[("GITLAB_SKIP_TLS_VERIFY", "gitlab.skip_tls_verify")];

/// Aliases of the read-only switch; read-only is on when any of them is true
const READ_ONLY_VARS: &[&str] = &["GITLAB_READ_ONLY_MODE", "GITLAB_READONLY"];

/// Comma separated list variables mapped onto config keys
const LIST_OVERRIDES: &[(&str, &str)] = &[
    ("GITLAB_DENIED_ACTIONS", "tools.denied_actions"),
    ("GITLAB_ALLOWED_TOOLS", "tools.allowed_tools"),
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and the process environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    load_config_with_env(config_path, std::env::vars().collect())
}

/// Load configuration from files and an explicit environment map
pub fn load_config_with_env(
    config_path: Option<&str>,
    env: HashMap<String, String>,
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // GITLAB_MCP__GITLAB__URL -> gitlab.url
    builder = builder.add_source(
        Environment::with_prefix("GITLAB_MCP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(Some(env.clone())),
    );

    builder = apply_env_overrides(builder, &env)?;

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    env: &HashMap<String, String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let set = |builder: ConfigBuilder<DefaultState>, key: &str, value: config::Value| {
        builder
            .set_override(key, value)
            .map_err(|e| ConfigError::Load(e.to_string()))
    };

    // Later entries win, so the preferred name of each pair comes last
    for (var, key) in STRING_OVERRIDES {
        if let Some(value) = env.get(*var).filter(|v| !v.trim().is_empty()) {
            builder = set(builder, key, value.trim().to_string().into())?;
        }
    }

    for (var, key) in BOOL_OVERRIDES {
        if let Some(value) = env_bool(env, var)? {
            builder = set(builder, key, value.into())?;
        }
    }

    let mut read_only = None;
    for var in READ_ONLY_VARS {
        if let Some(value) = env_bool(env, var)? {
            read_only = Some(read_only.unwrap_or(false) || value);
        }
    }
    if let Some(value) = read_only {
        builder = set(builder, "tools.read_only", value.into())?;
    }

    for (var, key) in LIST_OVERRIDES {
        if let Some(raw) = env.get(*var) {
            let items: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            builder = set(builder, key, items.into())?;
        }
    }

    if let Some(raw) = env.get("GITLAB_API_TIMEOUT_MS") {
        let timeout: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
            message: format!("GITLAB_API_TIMEOUT_MS must be a number, got: {}", raw),
        })?;
        builder = set(builder, "gitlab.timeout_ms", (timeout as i64).into())?;
    }

    Ok(builder)
}

/// Boolean variable, `None` when unset or blank
fn env_bool(env: &HashMap<String, String>, var: &str) -> Result<Option<bool>, ConfigError> {
    match env.get(var).filter(|v| !v.trim().is_empty()) {
        Some(raw) => parse_bool(raw).map(Some).ok_or_else(|| ConfigError::Invalid {
            message: format!("{} must be a boolean, got: {}", var, raw),
        }),
        None => Ok(None),
    }
}

/// Validate configuration values
///
/// A missing token is not an error here: the server reports it when it
/// builds the auth provider, and `list-tools` does not need one.
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.gitlab.url.is_empty() {
        return Err(ConfigError::Missing {
            field: "gitlab.url".to_string(),
        });
    }

    if !config.gitlab.url.starts_with("http://") && !config.gitlab.url.starts_with("https://") {
        return Err(ConfigError::Invalid {
            message: format!(
                "gitlab.url must start with http:// or https://, got: {}",
                config.gitlab.url
            ),
        });
    }

    if config.gitlab.timeout_ms == 0 {
        return Err(ConfigError::Invalid {
            message: "gitlab.timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    Ok(())
}
