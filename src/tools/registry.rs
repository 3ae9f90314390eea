//! Per-entity tool registry
//!
//! Each entity (`core`, `milestones`, ...) owns one registry mapping tool name
//! to its definition. Registries are filled once at start-up and only read
//! afterwards.

use crate::catalog::{
    ActionGuard, ActionScoped, Entity, OperationType, SchemaMode, ToolShape, shape_input_schema,
};
use crate::error::ToolError;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolInfo, ToolOutput};
// async_trait required for dyn-compatibility with Box<dyn ToolHandler>
use async_trait::async_trait;
use schemars::Schema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A registered tool with all its metadata
pub struct RegisteredTool {
    pub name: &'static str,
    pub description: &'static str,
    pub entity: Entity,
    pub shape: ToolShape,
    /// Schema generated from the input type, before shaping
    pub input_schema: Schema,
    handler: Box<dyn ToolHandler>,
}

impl RegisteredTool {
    /// Input schema as exposed to clients, keeping only `allowed_actions`
    pub fn shaped_schema(
        &self,
        allowed_actions: Option<&[&str]>,
        mode: SchemaMode,
    ) -> Map<String, Value> {
        shape_input_schema(self.input_schema.as_value(), allowed_actions, mode)
    }

    /// Parse raw arguments, run the guard on the selected action, execute
    pub async fn call(
        &self,
        ctx: &ToolContext,
        args: Value,
        guard: &ActionGuard<'_>,
    ) -> Result<ToolOutput, ToolError> {
        self.handler.call(ctx, args, guard).await
    }

    /// Operation class of a single-purpose tool
    pub fn operation(&self) -> Option<OperationType> {
        match self.shape {
            ToolShape::Single(op) => Some(op),
            ToolShape::Actions(_) => None,
        }
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.name)
            .field("entity", &self.entity)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Internal trait for type-erased tool handling
#[async_trait]
trait ToolHandler: Send + Sync {
    async fn call(
        &self,
        ctx: &ToolContext,
        args: Value,
        guard: &ActionGuard<'_>,
    ) -> Result<ToolOutput, ToolError>;
}

struct TypedToolHandler<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

#[async_trait]
impl<T> ToolHandler for TypedToolHandler<T>
where
    T: ToolExecutor + ActionScoped + DeserializeOwned + Send + Sync + 'static,
{
    async fn call(
        &self,
        ctx: &ToolContext,
        args: Value,
        guard: &ActionGuard<'_>,
    ) -> Result<ToolOutput, ToolError> {
        let tool: T = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(format!("Failed to parse arguments: {}", e)))?;

        guard.check(tool.action(), tool.operation())?;

        tool.execute(ctx).await
    }
}

/// Tools of one entity
pub struct EntityRegistry {
    entity: Entity,
    tools: BTreeMap<&'static str, RegisteredTool>,
}

impl EntityRegistry {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            tools: BTreeMap::new(),
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Register a tool input type. Re-registering a name replaces the entry.
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: ToolExecutor
            + ToolInfo
            + ActionScoped
            + DeserializeOwned
            + schemars::JsonSchema
            + Send
            + Sync
            + 'static,
    {
        let name = T::name();
        if T::entity() != self.entity {
            warn!(
                tool = name,
                declared = %T::entity(),
                registry = %self.entity,
                "Tool declares a different entity than its registry"
            );
        }

        let tool = RegisteredTool {
            name,
            description: T::description(),
            entity: self.entity,
            shape: T::shape(),
            input_schema: schemars::schema_for!(T),
            handler: Box::new(TypedToolHandler::<T> {
                _marker: std::marker::PhantomData,
            }),
        };

        if self.tools.insert(name, tool).is_some() {
            warn!(tool = name, "Tool registered twice, keeping the latest");
        }
        debug!(tool = name, entity = %self.entity, "Registered tool");
        self
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Every tool, ordered by name
    pub fn tools(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.tools.values()
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }

    /// All definitions of this entity
    pub fn tool_definitions(&self) -> Vec<&RegisteredTool> {
        self.tools.values().collect()
    }

    /// Tools kept under read-only mode: non-mutating single-purpose tools and
    /// action tools with at least one non-mutating action
    pub fn read_only_tool_names(&self) -> Vec<&'static str> {
        self.tools
            .values()
            .filter(|tool| tool.shape.has_read_only_operation())
            .map(|tool| tool.name)
            .collect()
    }

    /// All definitions, or only the read-only set
    pub fn filtered_tools(&self, read_only: bool) -> Vec<&RegisteredTool> {
        if !read_only {
            return self.tool_definitions();
        }
        let names = self.read_only_tool_names();
        self.tools
            .values()
            .filter(|tool| names.contains(&tool.name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let registry = EntityRegistry::new(Entity::Refs);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("nonexistent").is_none());
        assert!(registry.filtered_tools(true).is_empty());
        assert_eq!(registry.entity(), Entity::Refs);
    }
}
