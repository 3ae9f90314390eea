//! Catalog types
//!
//! Core types describing what a tool is: the entity it belongs to, whether
//! it is a single-purpose tool or an action-based one, and which of its
//! actions mutate GitLab state.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::gates::EnvGate;

/// GitLab subdomain grouping a set of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Core,
    Milestones,
    WorkItems,
    Releases,
    Variables,
    Webhooks,
    Refs,
    Integrations,
    Files,
}

impl Entity {
    /// Get the entity name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Entity::Core => "core",
            Entity::Milestones => "milestones",
            Entity::WorkItems => "workitems",
            Entity::Releases => "releases",
            Entity::Variables => "variables",
            Entity::Webhooks => "webhooks",
            Entity::Refs => "refs",
            Entity::Integrations => "integrations",
            Entity::Files => "files",
        }
    }

    /// Try to parse an entity from a string
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "core" => Some(Entity::Core),
            "milestones" => Some(Entity::Milestones),
            "workitems" | "work_items" => Some(Entity::WorkItems),
            "releases" => Some(Entity::Releases),
            "variables" => Some(Entity::Variables),
            "webhooks" => Some(Entity::Webhooks),
            "refs" => Some(Entity::Refs),
            "integrations" => Some(Entity::Integrations),
            "files" => Some(Entity::Files),
            _ => None,
        }
    }

    /// Get all entities in catalog order
    pub const fn all() -> &'static [Entity] {
        &[
            Entity::Core,
            Entity::Milestones,
            Entity::WorkItems,
            Entity::Releases,
            Entity::Variables,
            Entity::Webhooks,
            Entity::Refs,
            Entity::Integrations,
            Entity::Files,
        ]
    }

    /// Environment gate controlling the whole entity; core tools are always on
    pub const fn gate(&self) -> Option<EnvGate> {
        let env_var = match self {
            Entity::Core => return None,
            Entity::Milestones => "USE_MILESTONE",
            Entity::WorkItems => "USE_WORKITEMS",
            Entity::Releases => "USE_RELEASES",
            Entity::Variables => "USE_VARIABLES",
            Entity::Webhooks => "USE_WEBHOOKS",
            Entity::Refs => "USE_REFS",
            Entity::Integrations => "USE_INTEGRATIONS",
            Entity::Files => "USE_FILES",
        };
        Some(EnvGate::new(env_var, true, self.as_str()))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operation type for determining read vs write access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Read operations (get, list, search)
    Read,
    /// Write operations (create, update)
    Write,
    /// Delete operations
    Delete,
    /// Execute operations (promote, test, fork)
    Execute,
}

impl OperationType {
    /// Check if this operation is read-only
    pub const fn is_read_only(&self) -> bool {
        matches!(self, OperationType::Read)
    }

    /// Check if this operation modifies data
    pub const fn is_mutating(&self) -> bool {
        !self.is_read_only()
    }

    /// Get the operation name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationType::Read => "read",
            OperationType::Write => "write",
            OperationType::Delete => "delete",
            OperationType::Execute => "execute",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One action of an action-based tool, with its explicit mutation class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionSpec {
    pub name: &'static str,
    pub operation: OperationType,
}

impl ActionSpec {
    pub const fn new(name: &'static str, operation: OperationType) -> Self {
        Self { name, operation }
    }

    pub const fn mutates(&self) -> bool {
        self.operation.is_mutating()
    }
}

/// How a tool's operations are declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolShape {
    /// One operation, no `action` discriminator
    Single(OperationType),
    /// Several actions selected by the caller's `action` field
    Actions(&'static [ActionSpec]),
}

impl ToolShape {
    /// Actions of an action-based tool; empty for single-purpose tools
    pub fn actions(&self) -> &'static [ActionSpec] {
        match self {
            ToolShape::Single(_) => &[],
            ToolShape::Actions(actions) => actions,
        }
    }

    pub fn action(&self, name: &str) -> Option<&'static ActionSpec> {
        self.actions().iter().find(|a| a.name == name)
    }

    pub fn is_action_based(&self) -> bool {
        matches!(self, ToolShape::Actions(_))
    }

    /// Whether the tool stays listed under read-only mode.
    ///
    /// Action-based tools qualify when at least one action is non-mutating;
    /// their mutating actions are rejected at call time.
    pub fn has_read_only_operation(&self) -> bool {
        match self {
            ToolShape::Single(op) => op.is_read_only(),
            ToolShape::Actions(actions) => actions.iter().any(|a| !a.mutates()),
        }
    }

    /// Whether anything this tool can do mutates GitLab state
    pub fn has_mutating_operation(&self) -> bool {
        match self {
            ToolShape::Single(op) => op.is_mutating(),
            ToolShape::Actions(actions) => actions.iter().any(ActionSpec::mutates),
        }
    }
}

/// Implemented by every tool input type; reports what a parsed call will do.
pub trait ActionScoped {
    /// Selected action, `None` for single-purpose tools
    fn action(&self) -> Option<&'static str>;

    /// Operation class of the selected action
    fn operation(&self) -> OperationType;
}
