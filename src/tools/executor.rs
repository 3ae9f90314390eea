//! Tool execution primitives
//!
//! Every tool input type implements [`ToolExecutor`]; the `#[gitlab_tool]`
//! macro supplies [`ToolInfo`] and the action metadata.

use crate::catalog::{Entity, ToolShape};
use crate::error::ToolError;
use crate::gitlab::GitLabClient;
use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Static description of a tool, generated by `#[gitlab_tool]`
pub trait ToolInfo {
    fn name() -> &'static str;
    fn description() -> &'static str;
    fn entity() -> Entity;
    fn shape() -> ToolShape;
}

/// Per-call context handed to executors
#[derive(Clone)]
pub struct ToolContext {
    pub gitlab: Arc<GitLabClient>,
    /// Random hex id attached to every log line of one call
    pub request_id: String,
}

impl ToolContext {
    pub fn new(gitlab: Arc<GitLabClient>, request_id: impl Into<String>) -> Self {
        Self {
            gitlab,
            request_id: request_id.into(),
        }
    }

    /// Context with a freshly generated request id
    pub fn for_call(gitlab: Arc<GitLabClient>) -> Self {
        Self::new(gitlab, format!("{:x}", rand::random::<u64>()))
    }
}

/// One piece of tool output
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text { text: String },
    /// Base64 payload
    Image { data: String, mime_type: String },
}

/// Result of a tool call before conversion to MCP content
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Pretty-printed JSON. `null` (empty 204 bodies) becomes a short success note.
    pub fn json_value(value: Value) -> Result<Self, ToolError> {
        if value.is_null() {
            return Ok(Self::text("{\"success\": true}"));
        }
        Ok(Self::text(serde_json::to_string_pretty(&value)?))
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        Self::json_value(serde_json::to_value(value)?)
    }

    pub fn image(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Image {
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
                mime_type: mime_type.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Concatenated text blocks, mostly useful in tests and the CLI
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Implemented by every tool input type
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_output() {
        let output = ToolOutput::json_value(json!({"id": 1})).unwrap();
        assert!(!output.is_error);
        assert!(output.text_content().contains("\"id\": 1"));
    }

    #[test]
    fn test_null_is_success() {
        let output = ToolOutput::json_value(Value::Null).unwrap();
        assert_eq!(output.text_content(), "{\"success\": true}");
    }

    #[test]
    fn test_image_is_base64() {
        let output = ToolOutput::image(b"\x89PNG", "image/png");
        match &output.content[0] {
            ContentBlock::Image { data, mime_type } => {
                assert_eq!(data, "iVBORw==");
                assert_eq!(mime_type, "image/png");
            }
            other => panic!("unexpected block {:?}", other),
        }
        assert!(output.text_content().is_empty());
    }
}
