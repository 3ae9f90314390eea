//! MCP server handler
//!
//! Lists the filtered catalog and forwards calls to the registry manager.

use crate::config::AppConfig;
use crate::error::ToolError;
use crate::error::mcp_mapper::{is_protocol_error, map_tool_error};
use crate::gitlab::GitLabClient;
use crate::tools::{ContentBlock, RegistryManager, ToolContext, ToolOutput};
use rmcp::ErrorData as McpError;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, CompleteRequestParam, CompleteResult, CompletionInfo,
    Content, Implementation, InitializeResult, ListToolsResult, PaginatedRequestParam,
    ProtocolVersion, ServerCapabilities, Tool, ToolsCapability,
};
use rmcp::service::{RequestContext, RoleServer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Completion responses are capped at this many values
const MAX_COMPLETIONS: usize = 100;

/// GitLab MCP server handler
#[derive(Clone)]
pub struct GitLabMcpHandler {
    /// Server name for MCP
    name: String,
    /// Server version
    version: String,
    manager: Arc<RegistryManager>,
    gitlab: Arc<GitLabClient>,
}

impl GitLabMcpHandler {
    /// Create a handler sharing the catalog and client with other sessions
    pub fn new(
        config: &AppConfig,
        manager: Arc<RegistryManager>,
        gitlab: Arc<GitLabClient>,
    ) -> Self {
        info!(
            registered = manager.len(),
            read_only = manager.policy().read_only(),
            "Initialized GitLab MCP handler"
        );

        Self {
            name: config.server.name.clone(),
            version: config.server.version.clone(),
            manager,
            gitlab,
        }
    }

    pub fn manager(&self) -> &RegistryManager {
        &self.manager
    }

    /// Number of tools a client will see
    pub fn tool_count(&self) -> usize {
        self.manager.filtered_tool_definitions().len()
    }

    /// The catalog in MCP form
    pub fn mcp_tools(&self) -> Vec<Tool> {
        self.manager
            .exposed_tools()
            .into_iter()
            .map(|exposed| Tool {
                name: Cow::Borrowed(exposed.tool.name),
                description: Some(Cow::Borrowed(exposed.tool.description)),
                input_schema: Arc::new(exposed.input_schema),
                annotations: None,
                icons: None,
                meta: None,
                output_schema: None,
                title: None,
            })
            .collect()
    }

    /// Run one tool call.
    ///
    /// Unknown tools and malformed arguments are protocol errors; anything
    /// that fails once the call is accepted comes back as an error result.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, McpError> {
        let ctx = ToolContext::for_call(self.gitlab.clone());
        let args = arguments.map(Value::Object).unwrap_or_else(|| Value::Object(Map::new()));

        match self.manager.dispatch(name, &ctx, args).await {
            Ok(output) => Ok(to_mcp_result(output)),
            Err(e) if is_protocol_error(&e) => {
                debug!(error = %e, "Rejected tool call");
                Err(map_tool_error(&e))
            }
            Err(e) => {
                error!(error = %e, request_id = %ctx.request_id, "Tool execution failed");
                Ok(error_result(&e))
            }
        }
    }

    /// Exposed tool names starting with `prefix`
    pub fn tool_completions(&self, prefix: &str) -> Vec<String> {
        self.manager
            .filtered_tool_definitions()
            .into_iter()
            .filter(|tool| tool.name.starts_with(prefix))
            .map(|tool| tool.name.to_string())
            .collect()
    }

    fn instructions(&self) -> String {
        let mut text = String::from(
            "GitLab MCP server. Action-based tools take an `action` field selecting the operation.",
        );
        if self.manager.policy().read_only() {
            text.push_str(" Read-only mode: mutating operations are unavailable.");
        }
        text
    }
}

/// Convert tool output to an MCP result
pub fn to_mcp_result(output: ToolOutput) -> CallToolResult {
    let content = output
        .content
        .into_iter()
        .map(|block| match block {
            ContentBlock::Text { text } => Content::text(text),
            ContentBlock::Image { data, mime_type } => Content::image(data, mime_type),
        })
        .collect();

    CallToolResult {
        content,
        is_error: Some(output.is_error),
        meta: None,
        structured_content: None,
    }
}

fn error_result(error: &ToolError) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(format!("Error: {}", error))],
        is_error: Some(true),
        meta: None,
        structured_content: None,
    }
}

impl ServerHandler for GitLabMcpHandler {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                completions: Some(Map::new()),
                ..Default::default()
            },
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(self.instructions()),
        }
    }

    #[instrument(skip(self, _context))]
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        debug!("Listing tools");
        async move {
            Ok(ListToolsResult {
                tools: self.mcp_tools(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        debug!(?request.arguments, "Calling tool");
        async move { self.call(&request.name, request.arguments).await }
    }

    #[instrument(skip(self, _context))]
    fn complete(
        &self,
        request: CompleteRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CompleteResult, McpError>> + Send + '_ {
        async move {
            let values = match request.argument.name.as_str() {
                "name" | "tool" => self.tool_completions(&request.argument.value),
                _ => Vec::new(),
            };

            let total = values.len() as u32;
            let has_more = values.len() > MAX_COMPLETIONS;
            let values = values.into_iter().take(MAX_COMPLETIONS).collect();

            Ok(CompleteResult {
                completion: CompletionInfo {
                    values,
                    total: Some(total),
                    has_more: Some(has_more),
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_mcp_result_keeps_error_flag() {
        let result = to_mcp_result(ToolOutput::error("boom"));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);

        let result = to_mcp_result(ToolOutput::image(&[1, 2, 3], "image/png"));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.content.len(), 1);
    }

    #[test]
    fn test_error_result_prefix() {
        let result = error_result(&ToolError::ExecutionFailed("upstream".into()));
        assert_eq!(result.is_error, Some(true));
        let block = serde_json::to_value(&result.content[0]).unwrap();
        assert_eq!(block["text"], "Error: Tool execution failed: upstream");
    }
}
