//! MCP error code mapping.
//!
//! Protocol-level problems (unknown tool, malformed arguments) become
//! `Err(McpError)`. Everything that happens once a call is accepted, including
//! policy denials and GitLab failures, is reported as a tool result with
//! `is_error: true` so the client can show it to the model.

use rmcp::ErrorData as McpError;
use rmcp::model::ErrorCode;
use serde_json::json;
use std::borrow::Cow;

use super::{AccessDeniedError, GitLabError, ToolError};

/// Whether a tool error belongs on the protocol channel rather than in a result
pub fn is_protocol_error(error: &ToolError) -> bool {
    matches!(
        error,
        ToolError::NotFound(_)
            | ToolError::InvalidArguments(_)
            | ToolError::MissingArgument(_)
            | ToolError::Serialization(_)
    )
}

/// Maps a `ToolError` to an MCP protocol error.
pub fn map_tool_error(error: &ToolError) -> McpError {
    match error {
        ToolError::NotFound(name) => McpError {
            code: ErrorCode::METHOD_NOT_FOUND,
            message: Cow::Owned(format!("Tool '{}' not found", name)),
            data: Some(json!({
                "tool": name,
                "error_type": "ToolNotFound"
            })),
        },

        ToolError::InvalidArguments(msg) => McpError {
            code: ErrorCode::INVALID_PARAMS,
            message: Cow::Owned(msg.clone()),
            data: Some(json!({
                "error_type": "InvalidArguments"
            })),
        },

        ToolError::MissingArgument(arg) => McpError {
            code: ErrorCode::INVALID_PARAMS,
            message: Cow::Owned(format!("Missing required argument: {}", arg)),
            data: Some(json!({
                "argument": arg,
                "error_type": "MissingArgument"
            })),
        },

        ToolError::Serialization(e) => McpError {
            code: ErrorCode::INVALID_PARAMS,
            message: Cow::Owned(format!("Invalid argument format: {}", e)),
            data: Some(json!({
                "error_type": "SerializationError"
            })),
        },

        ToolError::ExecutionFailed(msg) => internal_error(msg.clone()),

        ToolError::ResourceNotFound(what) => McpError {
            code: ErrorCode::RESOURCE_NOT_FOUND,
            message: Cow::Owned(format!("Not found: {}", what)),
            data: Some(json!({
                "error_type": "NotFound"
            })),
        },

        ToolError::GitLab(gitlab_err) => map_gitlab_error(gitlab_err),

        ToolError::AccessDenied(access_err) => map_access_denied_error(access_err),
    }
}

/// Maps a `GitLabError` to an MCP protocol error.
pub fn map_gitlab_error(error: &GitLabError) -> McpError {
    let (code, error_type, status) = match error {
        GitLabError::Api { status: 404, .. } => (ErrorCode::RESOURCE_NOT_FOUND, "NotFound", Some(404)),
        GitLabError::Api { status, .. } => (ErrorCode::INTERNAL_ERROR, "ApiError", Some(*status)),
        GitLabError::Timeout { .. } => (ErrorCode::INTERNAL_ERROR, "Timeout", None),
        GitLabError::GraphQL(_) => (ErrorCode::INTERNAL_ERROR, "GraphQLError", None),
        GitLabError::Request(_) => (ErrorCode::INTERNAL_ERROR, "RequestError", None),
        GitLabError::InvalidResponse(_) => (ErrorCode::INTERNAL_ERROR, "InvalidResponse", None),
        GitLabError::Setup(_) => (ErrorCode::INTERNAL_ERROR, "SetupError", None),
    };

    McpError {
        code,
        message: Cow::Owned(error.to_string()),
        data: Some(json!({
            "error_type": error_type,
            "status": status
        })),
    }
}

/// Maps an `AccessDeniedError` to an MCP protocol error.
pub fn map_access_denied_error(error: &AccessDeniedError) -> McpError {
    McpError {
        code: ErrorCode::INVALID_REQUEST,
        message: Cow::Owned(error.to_string()),
        data: Some(json!({
            "error_type": "AccessDenied",
            "tool": error.tool,
            "action": error.action,
            "reason": error.reason
        })),
    }
}

/// Creates an MCP error for an internal server error.
pub fn internal_error(message: impl Into<String>) -> McpError {
    McpError {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::Owned(message.into()),
        data: Some(json!({
            "error_type": "InternalError"
        })),
    }
}
