//! Aggregating registry manager
//!
//! Merges every entity registry into one catalog, applies the cross-cutting
//! filters of a [`CatalogPolicy`] and dispatches calls by tool name. Built
//! once at start-up and shared behind an `Arc`.

use crate::catalog::{
    ActionGuard, ActionSpec, CatalogMetadata, CatalogPolicy, Entity, SchemaMode, ToolShape,
};
use crate::error::ToolError;
use crate::tools::definitions;
use crate::tools::executor::{ToolContext, ToolOutput};
use crate::tools::registry::{EntityRegistry, RegisteredTool};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A tool as exposed to clients under a given policy
#[derive(Debug)]
pub struct ExposedTool<'a> {
    pub tool: &'a RegisteredTool,
    /// Actions still callable; empty for single-purpose tools
    pub actions: Vec<&'static ActionSpec>,
    pub input_schema: Map<String, Value>,
}

pub struct RegistryManager {
    registries: Vec<EntityRegistry>,
    /// tool name -> index into `registries`
    index: HashMap<&'static str, usize>,
    metadata: CatalogMetadata,
    policy: CatalogPolicy,
    schema_mode: SchemaMode,
}

impl RegistryManager {
    /// Manager over the built-in catalog
    pub fn new(policy: CatalogPolicy) -> Self {
        Self::with_registries(
            definitions::all_registries(),
            CatalogMetadata::builtin(),
            policy,
        )
    }

    pub fn with_registries(
        registries: Vec<EntityRegistry>,
        metadata: CatalogMetadata,
        policy: CatalogPolicy,
    ) -> Self {
        let mut index = HashMap::new();
        for (position, registry) in registries.iter().enumerate() {
            for name in registry.tool_names() {
                if let Some(previous) = index.insert(name, position) {
                    warn!(
                        tool = name,
                        first = %registries[previous].entity(),
                        second = %registry.entity(),
                        "Tool name registered by two entities, the later one wins"
                    );
                }
            }
        }

        let manager = Self {
            registries,
            index,
            metadata,
            policy,
            schema_mode: SchemaMode::default(),
        };
        info!(
            registered = manager.index.len(),
            exposed = manager.filtered_tool_definitions().len(),
            read_only = manager.policy.read_only(),
            tier = ?manager.policy.tier(),
            "Initialized tool catalog"
        );
        manager
    }

    pub fn with_schema_mode(mut self, mode: SchemaMode) -> Self {
        self.schema_mode = mode;
        self
    }

    pub fn policy(&self) -> &CatalogPolicy {
        &self.policy
    }

    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    pub fn schema_mode(&self) -> SchemaMode {
        self.schema_mode
    }

    pub fn registries(&self) -> &[EntityRegistry] {
        &self.registries
    }

    pub fn registry(&self, entity: Entity) -> Option<&EntityRegistry> {
        self.registries.iter().find(|r| r.entity() == entity)
    }

    /// Registered tool by name, whether or not the policy exposes it
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        let position = *self.index.get(name)?;
        self.registries[position].get(name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Every registered definition, ordered by name
    pub fn all_tool_definitions_unfiltered(&self) -> Vec<&RegisteredTool> {
        let mut tools: Vec<&RegisteredTool> = self
            .index
            .keys()
            .filter_map(|name| self.get(name))
            .collect();
        tools.sort_by_key(|tool| tool.name);
        tools
    }

    /// Definitions after gates, read-only mode, allow/deny lists and denied
    /// actions, before tier filtering
    pub fn all_tool_definitions_tierless(&self) -> Vec<&RegisteredTool> {
        self.tierless_for(&self.policy)
    }

    pub fn tierless_for(&self, policy: &CatalogPolicy) -> Vec<&RegisteredTool> {
        let mut tools: Vec<&RegisteredTool> = self
            .registries
            .iter()
            .flat_map(|registry| registry.filtered_tools(policy.read_only()))
            .filter(|tool| self.owns(tool))
            .filter(|tool| policy.check_tool(tool.name, tool.entity, &self.metadata).is_ok())
            .filter(|tool| {
                !tool.shape.is_action_based() || !self.visible_actions(tool, policy, false).is_empty()
            })
            .collect();
        tools.sort_by_key(|tool| tool.name);
        tools
    }

    /// The catalog exposed to clients under the manager's policy
    pub fn filtered_tool_definitions(&self) -> Vec<&RegisteredTool> {
        self.filtered_for(&self.policy)
    }

    /// The catalog exposed under an arbitrary policy
    pub fn filtered_for(&self, policy: &CatalogPolicy) -> Vec<&RegisteredTool> {
        self.tierless_for(policy)
            .into_iter()
            .filter(|tool| policy.tier_met(self.metadata.tool_tier(tool.name)))
            .filter(|tool| {
                !tool.shape.is_action_based() || !self.visible_actions(tool, policy, true).is_empty()
            })
            .collect()
    }

    /// Exposed tools with their callable actions and shaped input schemas
    pub fn exposed_tools(&self) -> Vec<ExposedTool<'_>> {
        self.exposed_for(&self.policy)
    }

    pub fn exposed_for(&self, policy: &CatalogPolicy) -> Vec<ExposedTool<'_>> {
        self.filtered_for(policy)
            .into_iter()
            .map(|tool| {
                let actions = self.visible_actions(tool, policy, true);
                let input_schema = match tool.shape {
                    ToolShape::Single(_) => tool.shaped_schema(None, self.schema_mode),
                    ToolShape::Actions(_) => {
                        let names: Vec<&str> = actions.iter().map(|a| a.name).collect();
                        tool.shaped_schema(Some(&names), self.schema_mode)
                    }
                };
                ExposedTool {
                    tool,
                    actions,
                    input_schema,
                }
            })
            .collect()
    }

    /// Actions of a tool that survive read-only mode and denied actions,
    /// and optionally the tier check
    pub fn visible_actions(
        &self,
        tool: &RegisteredTool,
        policy: &CatalogPolicy,
        check_tier: bool,
    ) -> Vec<&'static ActionSpec> {
        tool.shape
            .actions()
            .iter()
            .filter(|action| policy.action_visible(tool.name, action.name, action.operation))
            .filter(|action| {
                !check_tier || policy.tier_met(self.metadata.action_tier(tool.name, action.name))
            })
            .collect()
    }

    /// Tool name -> action names, for validating profiles
    pub fn tool_action_index(&self) -> BTreeMap<String, Vec<String>> {
        self.all_tool_definitions_unfiltered()
            .into_iter()
            .map(|tool| {
                let actions = tool
                    .shape
                    .actions()
                    .iter()
                    .map(|a| a.name.to_string())
                    .collect();
                (tool.name.to_string(), actions)
            })
            .collect()
    }

    /// Invoke a tool by name.
    ///
    /// Unknown names fail with [`ToolError::NotFound`] without touching any
    /// handler. Known tools are checked against the policy, then their
    /// arguments are parsed and the selected action is checked before the
    /// handler runs.
    #[instrument(skip(self, ctx, args), fields(tool = %name, request_id = %ctx.request_id))]
    pub async fn dispatch(
        &self,
        name: &str,
        ctx: &ToolContext,
        args: Value,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let allowed = self
            .policy
            .check_tool(tool.name, tool.entity, &self.metadata)
            .and_then(|_| self.policy.check_tool_tier(tool.name, &self.metadata));
        if let Err(denied) = allowed {
            warn!(reason = %denied.reason, "Tool denied");
            return Err(denied.into());
        }

        let guard = ActionGuard::new(&self.policy, &self.metadata, tool.name);
        let result = tool.call(ctx, args, &guard).await;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            success = result.is_ok(),
            "Tool call finished"
        );
        result
    }

    /// Whether the index points at this exact registration (guards against
    /// shadowed duplicates being listed twice)
    fn owns(&self, tool: &RegisteredTool) -> bool {
        self.get(tool.name).is_some_and(|found| std::ptr::eq(found, tool))
    }
}
