//! Transport module
//!
//! stdio for local clients, streamable HTTP for remote ones.

pub mod http;
pub mod stdio;

pub use http::{DEFAULT_HTTP_PORT, HttpConfig, MCP_PATH, router, run_http};
pub use stdio::run_stdio;
