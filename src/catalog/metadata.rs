//! Tier and gate side table
//!
//! Tool definitions only know their entity. Tier requirements and gates that
//! differ from the entity default live here, keyed by tool name or by
//! `(tool, action)`.

use std::collections::HashMap;

use super::gates::EnvGate;
use super::tier::Tier;
use super::types::Entity;

#[derive(Debug, Clone, Default)]
pub struct CatalogMetadata {
    tool_tiers: HashMap<String, Tier>,
    action_tiers: HashMap<(String, String), Tier>,
    gates: HashMap<String, EnvGate>,
}

impl CatalogMetadata {
    /// No requirements at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Requirements of the built-in catalog
    pub fn builtin() -> Self {
        Self::empty().with_action_tier("browse_milestones", "burndown", Tier::Premium)
    }

    pub fn with_tool_tier(mut self, tool: &str, tier: Tier) -> Self {
        self.tool_tiers.insert(tool.to_string(), tier);
        self
    }

    pub fn with_action_tier(mut self, tool: &str, action: &str, tier: Tier) -> Self {
        self.action_tiers
            .insert((tool.to_string(), action.to_string()), tier);
        self
    }

    /// Gate a single tool independently of its entity
    pub fn with_gate(mut self, tool: &str, gate: EnvGate) -> Self {
        self.gates.insert(tool.to_string(), gate);
        self
    }

    /// Minimum tier for the tool as a whole
    pub fn tool_tier(&self, tool: &str) -> Option<Tier> {
        self.tool_tiers.get(tool).copied()
    }

    /// Minimum tier for one action; a tool-level requirement applies too
    pub fn action_tier(&self, tool: &str, action: &str) -> Option<Tier> {
        let action_tier = self
            .action_tiers
            .get(&(tool.to_string(), action.to_string()))
            .copied();
        action_tier.max(self.tool_tier(tool))
    }

    /// Gate for a tool: a per-tool override, else its entity's gate
    pub fn gate_for(&self, tool: &str, entity: Entity) -> Option<EnvGate> {
        self.gates.get(tool).copied().or_else(|| entity.gate())
    }

    /// Every distinct gate relevant to the catalog, sorted by variable name
    pub fn all_gates(&self) -> Vec<EnvGate> {
        let mut gates: Vec<EnvGate> = Entity::all()
            .iter()
            .filter_map(Entity::gate)
            .chain(self.gates.values().copied())
            .collect();
        gates.sort_by_key(|g| g.env_var);
        gates.dedup_by_key(|g| g.env_var);
        gates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_burndown_is_premium() {
        let meta = CatalogMetadata::builtin();
        assert_eq!(
            meta.action_tier("browse_milestones", "burndown"),
            Some(Tier::Premium)
        );
        assert_eq!(meta.action_tier("browse_milestones", "list"), None);
        assert_eq!(meta.tool_tier("browse_milestones"), None);
    }

    #[test]
    fn test_tool_tier_applies_to_actions() {
        let meta = CatalogMetadata::empty()
            .with_tool_tier("manage_work_item", Tier::Premium)
            .with_action_tier("manage_work_item", "delete", Tier::Ultimate);

        assert_eq!(meta.action_tier("manage_work_item", "create"), Some(Tier::Premium));
        assert_eq!(meta.action_tier("manage_work_item", "delete"), Some(Tier::Ultimate));
    }

    #[test]
    fn test_gate_override() {
        let gate = EnvGate::new("USE_GROUP_CREATE", false, "group_create");
        let meta = CatalogMetadata::empty().with_gate("create_group", gate);

        assert_eq!(meta.gate_for("create_group", Entity::Core), Some(gate));
        assert_eq!(meta.gate_for("get_users", Entity::Core), None);
        assert_eq!(
            meta.gate_for("browse_releases", Entity::Releases).map(|g| g.env_var),
            Some("USE_RELEASES")
        );
        assert!(meta.all_gates().iter().any(|g| g.env_var == "USE_GROUP_CREATE"));
    }
}
