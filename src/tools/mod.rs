//! Tools module
//!
//! Tool input types and their executors live in `definitions`, one file per
//! entity. Each entity builds an [`EntityRegistry`]; the [`RegistryManager`]
//! aggregates them and is the only place calls are dispatched from.

pub mod definitions;
pub mod executor;
pub mod manager;
pub mod registry;

pub use executor::{ContentBlock, ToolContext, ToolExecutor, ToolInfo, ToolOutput};
pub use manager::{ExposedTool, RegistryManager};
pub use registry::{EntityRegistry, RegisteredTool};

pub use gitlab_mcp_macros::gitlab_tool;
