//! Catalog policy
//!
//! Everything that decides whether a tool, or one action of a tool, is
//! available: environment gates, tier requirements, read-only mode, the
//! profile allow-list, the deny regex and `tool:action` denials.

use std::collections::{BTreeSet, HashSet};
use tracing::warn;

use super::gates::GateValues;
use super::metadata::CatalogMetadata;
use super::patterns::PatternMatcher;
use super::tier::Tier;
use super::types::{Entity, OperationType};
use crate::error::AccessDeniedError;

/// Runtime filtering configuration, read-only once built
#[derive(Debug, Clone, Default)]
pub struct CatalogPolicy {
    read_only: bool,
    allowed_tools: Option<BTreeSet<String>>,
    denied_tools: PatternMatcher,
    denied_actions: HashSet<(String, String)>,
    tier: Option<Tier>,
    gates: GateValues,
}

impl CatalogPolicy {
    /// Everything allowed, no tier filtering, gates at their defaults
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Restrict the catalog to these names; an empty list means no restriction
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tools: BTreeSet<String> = tools.into_iter().map(Into::into).collect();
        self.allowed_tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    /// Deny tools whose name matches any pattern. Invalid patterns are
    /// logged and ignored.
    pub fn with_denied_patterns(mut self, patterns: &[String]) -> Self {
        self.denied_tools = PatternMatcher::lenient(patterns);
        self
    }

    pub fn with_denied_actions<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.denied_actions = entries
            .into_iter()
            .filter_map(|entry| parse_denied_action(entry.as_ref()))
            .collect();
        self
    }

    /// Instance tier; `None` disables tier filtering
    pub fn with_tier(mut self, tier: Option<Tier>) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_gates(mut self, gates: GateValues) -> Self {
        self.gates = gates;
        self
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn tier(&self) -> Option<Tier> {
        self.tier
    }

    pub fn gates(&self) -> &GateValues {
        &self.gates
    }

    pub fn allowed_tools(&self) -> Option<&BTreeSet<String>> {
        self.allowed_tools.as_ref()
    }

    /// Whether the tool's gate (per-tool override or entity gate) is open
    pub fn gate_open(&self, tool: &str, entity: Entity, metadata: &CatalogMetadata) -> bool {
        metadata
            .gate_for(tool, entity)
            .is_none_or(|gate| self.gates.is_enabled(&gate))
    }

    /// Gate, allow-list and deny-regex checks for a whole tool
    pub fn check_tool(
        &self,
        tool: &str,
        entity: Entity,
        metadata: &CatalogMetadata,
    ) -> Result<(), AccessDeniedError> {
        if let Some(gate) = metadata.gate_for(tool, entity) {
            if !self.gates.is_enabled(&gate) {
                return Err(AccessDeniedError::gate_disabled(tool, gate.env_var));
            }
        }

        if let Some(allowed) = &self.allowed_tools {
            if !allowed.contains(tool) {
                return Err(AccessDeniedError::not_in_allow_list(tool));
            }
        }

        if let Some(pattern) = self.denied_tools.find_match(tool) {
            return Err(AccessDeniedError::denied_by_pattern(tool, pattern));
        }

        Ok(())
    }

    /// Whether the instance tier covers a requirement. Always true when the
    /// tier is unknown.
    pub fn tier_met(&self, required: Option<Tier>) -> bool {
        match (self.tier, required) {
            (Some(current), Some(required)) => current.satisfies(required),
            _ => true,
        }
    }

    pub fn check_tool_tier(
        &self,
        tool: &str,
        metadata: &CatalogMetadata,
    ) -> Result<(), AccessDeniedError> {
        self.check_tier(tool, None, metadata.tool_tier(tool))
    }

    fn check_tier(
        &self,
        tool: &str,
        action: Option<&str>,
        required: Option<Tier>,
    ) -> Result<(), AccessDeniedError> {
        match (self.tier, required) {
            (Some(current), Some(required)) if !current.satisfies(required) => {
                Err(AccessDeniedError::tier_required(tool, required, current).for_action(action))
            }
            _ => Ok(()),
        }
    }

    pub fn is_action_denied(&self, tool: &str, action: &str) -> bool {
        self.denied_actions
            .contains(&(tool.to_string(), action.to_string()))
    }

    /// Whether an action stays in the exposed schema. Tier is not considered.
    pub fn action_visible(&self, tool: &str, action: &str, operation: OperationType) -> bool {
        !(self.read_only && operation.is_mutating()) && !self.is_action_denied(tool, action)
    }

    /// Read-only, denied-action and tier checks for one parsed call
    pub fn check_action(
        &self,
        tool: &str,
        action: Option<&str>,
        operation: OperationType,
        metadata: &CatalogMetadata,
    ) -> Result<(), AccessDeniedError> {
        if self.read_only && operation.is_mutating() {
            return Err(AccessDeniedError::read_only(tool).for_action(action));
        }

        let Some(action) = action else {
            return Ok(());
        };

        if self.is_action_denied(tool, action) {
            return Err(AccessDeniedError::action_denied(tool, action));
        }

        self.check_tier(tool, Some(action), metadata.action_tier(tool, action))
    }
}

fn parse_denied_action(entry: &str) -> Option<(String, String)> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    match entry.split_once(':') {
        Some((tool, action)) if !tool.trim().is_empty() && !action.trim().is_empty() => {
            Some((tool.trim().to_string(), action.trim().to_string()))
        }
        _ => {
            warn!(entry = %entry, "Ignoring malformed denied action, expected tool:action");
            None
        }
    }
}

/// Split a comma separated `GITLAB_DENIED_ACTIONS` value
pub fn split_denied_actions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Per-call view of the policy handed to a tool handler after its arguments
/// have been parsed.
pub struct ActionGuard<'a> {
    policy: &'a CatalogPolicy,
    metadata: &'a CatalogMetadata,
    tool: &'a str,
}

impl<'a> ActionGuard<'a> {
    pub fn new(policy: &'a CatalogPolicy, metadata: &'a CatalogMetadata, tool: &'a str) -> Self {
        Self {
            policy,
            metadata,
            tool,
        }
    }

    pub fn check(
        &self,
        action: Option<&str>,
        operation: OperationType,
    ) -> Result<(), AccessDeniedError> {
        let result = self
            .policy
            .check_action(self.tool, action, operation, self.metadata);
        if let Err(ref denied) = result {
            warn!(
                tool = %self.tool,
                action = ?action,
                reason = %denied.reason,
                "Action denied"
            );
        }
        result
    }
}
