//! Error types for gitlab-mcp
//!
//! Each layer has its own `thiserror` enum; conversion to MCP errors happens
//! at the handler boundary in [`mcp_mapper`].

pub mod mcp_mapper;

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown profile or preset '{0}'")]
    UnknownProfile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while talking to GitLab
#[derive(Error, Debug)]
pub enum GitLabError {
    /// Network failure other than a timeout; the message is passed through unchanged
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("API timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("GitLab API error: {status} {status_text}{}", detail_suffix(.detail))]
    Api {
        status: u16,
        status_text: String,
        detail: Option<String>,
    },

    #[error("GraphQL error: {0}")]
    GraphQL(String),

    #[error("Invalid response from GitLab: {0}")]
    InvalidResponse(String),

    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(" - {}", d),
        _ => String::new(),
    }
}

impl GitLabError {
    /// Create an API error from an HTTP status and the raw response body.
    ///
    /// `message` and `error` (and `error_description`) fields of a JSON body are
    /// extracted and joined; a non-JSON body is used verbatim.
    pub fn from_response(status: u16, status_text: &str, body: &str) -> Self {
        GitLabError::Api {
            status,
            status_text: status_text.to_string(),
            detail: extract_error_detail(body),
        }
    }

    /// Whether GitLab answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitLabError::Api { status: 404, .. })
    }

    /// HTTP status code, when the error came from a GitLab response
    pub fn status(&self) -> Option<u16> {
        match self {
            GitLabError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn extract_error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Some(body.to_string());
    };

    let parts: Vec<String> = ["message", "error", "error_description"]
        .iter()
        .filter_map(|key| value.get(*key))
        .map(flatten_message)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// GitLab returns `message` as a string, a list, or a map of field -> errors
fn flatten_message(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(flatten_message)
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(field, errors)| format!("{}: {}", field, flatten_message(errors)))
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A call refused by read-only mode, a deny rule, a gate or a tier requirement
#[derive(Error, Debug)]
#[error("{} is not allowed: {reason}", target_label(.tool, .action))]
pub struct AccessDeniedError {
    pub tool: String,
    pub action: Option<String>,
    pub reason: String,
}

fn target_label(tool: &str, action: &Option<String>) -> String {
    match action {
        Some(action) => format!("Action '{}' of tool '{}'", action, tool),
        None => format!("Tool '{}'", tool),
    }
}

impl AccessDeniedError {
    pub fn new(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            action: None,
            reason: reason.into(),
        }
    }

    /// Attach the action the denial applies to
    pub fn for_action(mut self, action: Option<&str>) -> Self {
        self.action = action.map(str::to_string);
        self
    }

    pub fn read_only(tool: impl Into<String>) -> Self {
        Self::new(
            tool,
            "write operations are not permitted in read-only mode",
        )
    }

    pub fn denied_by_pattern(tool: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(tool, format!("denied by pattern '{}'", pattern.into()))
    }

    pub fn not_in_allow_list(tool: impl Into<String>) -> Self {
        Self::new(tool, "not in the allowed tools of the active profile")
    }

    pub fn action_denied(tool: impl Into<String>, action: &str) -> Self {
        Self::new(tool, "denied by GITLAB_DENIED_ACTIONS").for_action(Some(action))
    }

    pub fn gate_disabled(tool: impl Into<String>, env_var: &str) -> Self {
        Self::new(tool, format!("disabled by {}", env_var))
    }

    pub fn tier_required(
        tool: impl Into<String>,
        required: crate::catalog::Tier,
        current: crate::catalog::Tier,
    ) -> Self {
        Self::new(
            tool,
            format!(
                "requires GitLab {} tier (instance is {})",
                required, current
            ),
        )
    }
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("{0}")]
    GitLab(#[from] GitLabError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Not found: {0}")]
    ResourceNotFound(String),

    #[error("{0}")]
    AccessDenied(#[from] AccessDeniedError),
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No authentication configured (set GITLAB_TOKEN or GITLAB_AUTH_COOKIE_PATH)")]
    NotConfigured,

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Failed to read cookie file {path}: {reason}")]
    CookieFile { path: String, reason: String },
}

/// Result type alias for tool operations
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Result type alias for GitLab API operations
pub type GitLabResult<T> = std::result::Result<T, GitLabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitlab_error_from_response() {
        let err = GitLabError::from_response(404, "Not Found", "");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "GitLab API error: 404 Not Found");

        let err = GitLabError::from_response(
            400,
            "Bad Request",
            r#"{"message": "title is missing", "error": "invalid"}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.to_string(),
            "GitLab API error: 400 Bad Request - title is missing; invalid"
        );
    }

    #[test]
    fn test_field_error_map_is_flattened() {
        let err = GitLabError::from_response(
            422,
            "Unprocessable Entity",
            r#"{"message": {"name": ["has already been taken"]}}"#,
        );
        assert!(err.to_string().contains("name: has already been taken"));
    }

    #[test]
    fn test_plain_text_body_is_kept() {
        let err = GitLabError::from_response(502, "Bad Gateway", "upstream unavailable");
        assert!(err.to_string().ends_with("- upstream unavailable"));
    }

    #[test]
    fn test_timeout_message() {
        let err = GitLabError::Timeout { timeout_ms: 1500 };
        assert_eq!(err.to_string(), "API timeout after 1500ms");
    }

    #[test]
    fn test_access_denied_constructors() {
        let err = AccessDeniedError::read_only("manage_integration").for_action(Some("update"));
        let message = err.to_string();
        assert!(message.contains("read-only"));
        assert!(message.contains("not allowed"));
        assert!(message.contains("'update'"));

        let err = AccessDeniedError::denied_by_pattern("manage_ref", "^manage_");
        assert!(err.reason.contains("^manage_"));

        let err = AccessDeniedError::gate_disabled("browse_milestones", "USE_MILESTONE");
        assert!(err.to_string().contains("USE_MILESTONE"));
    }
}
