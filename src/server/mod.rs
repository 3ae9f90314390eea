//! MCP protocol surface

pub mod handler;

pub use handler::{GitLabMcpHandler, to_mcp_result};
