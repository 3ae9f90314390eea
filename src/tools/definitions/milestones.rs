//! Milestone tools
//!
//! Milestones exist on both projects and groups, so every call takes a
//! `namespace` and resolves its scope first.

use crate::catalog::Entity;
use crate::error::ToolError;
use crate::gitlab::resolve_namespace;
use crate::tools::EntityRegistry;
use crate::tools::definitions::core::insert_opt;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use crate::util::QueryBuilder;
use async_trait::async_trait;
use gitlab_mcp_macros::gitlab_tool;
use serde_json::{Value, json};

/// Read milestones of a project or group
#[gitlab_tool(
    name = "browse_milestones",
    description = "List or get milestones of a project or group, with their issues, merge requests or burndown events",
    entity = "milestones"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseMilestones {
    /// List milestones
    #[action(read)]
    List {
        /// Project or group ID or path
        namespace: String,
        /// active or closed
        #[serde(default)]
        state: Option<String>,
        #[serde(default)]
        search: Option<String>,
        /// Include milestones of ancestor groups
        #[serde(default)]
        include_ancestors: bool,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Get one milestone
    #[action(read)]
    Get { namespace: String, milestone_id: u64 },
    /// Issues assigned to a milestone
    #[action(read)]
    Issues { namespace: String, milestone_id: u64 },
    /// Merge requests assigned to a milestone
    #[action(read)]
    MergeRequests { namespace: String, milestone_id: u64 },
    /// Burndown chart events (Premium)
    #[action(read)]
    Burndown { namespace: String, milestone_id: u64 },
}

impl BrowseMilestones {
    fn namespace(&self) -> &str {
        match self {
            Self::List { namespace, .. }
            | Self::Get { namespace, .. }
            | Self::Issues { namespace, .. }
            | Self::MergeRequests { namespace, .. }
            | Self::Burndown { namespace, .. } => namespace,
        }
    }
}

#[async_trait]
impl ToolExecutor for BrowseMilestones {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let ns = resolve_namespace(&ctx.gitlab, self.namespace()).await?;

        let suffix = match self {
            Self::List {
                state,
                search,
                include_ancestors,
                per_page,
                page,
                ..
            } => {
                let query = QueryBuilder::new()
                    .optional("state", state.as_deref())
                    .optional("search", search.as_deref())
                    .flag("include_ancestors", *include_ancestors)
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                format!("milestones{}", query)
            }
            Self::Get { milestone_id, .. } => format!("milestones/{}", milestone_id),
            Self::Issues { milestone_id, .. } => format!("milestones/{}/issues", milestone_id),
            Self::MergeRequests { milestone_id, .. } => {
                format!("milestones/{}/merge_requests", milestone_id)
            }
            Self::Burndown { milestone_id, .. } => {
                format!("milestones/{}/burndown_events", milestone_id)
            }
        };

        let result: Value = ctx.gitlab.get(&ns.path(&suffix)).await?;
        ToolOutput::json_value(result)
    }
}

/// Create, update, delete or promote milestones
#[gitlab_tool(
    name = "manage_milestone",
    description = "Create, update, delete milestones of a project or group, or promote a project milestone to its group",
    entity = "milestones"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageMilestone {
    /// Create a milestone
    #[action(write)]
    Create {
        namespace: String,
        title: String,
        #[serde(default)]
        description: Option<String>,
        /// YYYY-MM-DD
        #[serde(default)]
        due_date: Option<String>,
        /// YYYY-MM-DD
        #[serde(default)]
        start_date: Option<String>,
    },
    /// Update a milestone
    #[action(write)]
    Update {
        namespace: String,
        milestone_id: u64,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        due_date: Option<String>,
        #[serde(default)]
        start_date: Option<String>,
        /// close or activate
        #[serde(default)]
        state_event: Option<String>,
    },
    /// Delete a milestone
    #[action(delete)]
    Delete { namespace: String, milestone_id: u64 },
    /// Promote a project milestone to a group milestone
    #[action(write)]
    Promote { namespace: String, milestone_id: u64 },
}

#[async_trait]
impl ToolExecutor for ManageMilestone {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let result: Value = match self {
            Self::Create {
                namespace,
                title,
                description,
                due_date,
                start_date,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let mut body = json!({ "title": title });
                insert_opt(&mut body, "description", description.as_deref());
                insert_opt(&mut body, "due_date", due_date.as_deref());
                insert_opt(&mut body, "start_date", start_date.as_deref());
                ctx.gitlab.post(&ns.path("milestones"), &body).await?
            }
            Self::Update {
                namespace,
                milestone_id,
                title,
                description,
                due_date,
                start_date,
                state_event,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let mut body = json!({});
                insert_opt(&mut body, "title", title.as_deref());
                insert_opt(&mut body, "description", description.as_deref());
                insert_opt(&mut body, "due_date", due_date.as_deref());
                insert_opt(&mut body, "start_date", start_date.as_deref());
                insert_opt(&mut body, "state_event", state_event.as_deref());
                let path = ns.path(&format!("milestones/{}", milestone_id));
                ctx.gitlab.put(&path, &body).await?
            }
            Self::Delete {
                namespace,
                milestone_id,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let path = ns.path(&format!("milestones/{}", milestone_id));
                ctx.gitlab.delete(&path).await?
            }
            Self::Promote {
                namespace,
                milestone_id,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                if ns.scope != crate::gitlab::NamespaceScope::Project {
                    return Err(ToolError::InvalidArguments(
                        "only project milestones can be promoted".into(),
                    ));
                }
                let path = ns.path(&format!("milestones/{}/promote", milestone_id));
                ctx.gitlab.post(&path, &json!({})).await?
            }
        };

        ToolOutput::json_value(result)
    }
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::Milestones);
    registry
        .register::<BrowseMilestones>()
        .register::<ManageMilestone>();
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionScoped, OperationType};
    use crate::tools::ToolInfo;

    #[test]
    fn test_action_flags() {
        let shape = ManageMilestone::shape();
        assert_eq!(shape.actions().len(), 4);
        assert!(shape.actions().iter().all(|a| a.mutates()));
        assert_eq!(shape.action("delete").unwrap().operation, OperationType::Delete);

        let shape = BrowseMilestones::shape();
        assert!(shape.action("merge_requests").is_some());
        assert!(!shape.has_mutating_operation());
    }

    #[test]
    fn test_namespace_accessor() {
        let tool: BrowseMilestones = serde_json::from_value(json!({
            "action": "burndown",
            "namespace": "my-group",
            "milestone_id": 3
        }))
        .unwrap();
        assert_eq!(tool.namespace(), "my-group");
        assert_eq!(tool.action(), Some("burndown"));
    }
}
