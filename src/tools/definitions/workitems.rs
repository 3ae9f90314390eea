//! Work item tools (GraphQL)
//!
//! Issues, tasks, epics and the other work item types share one GraphQL API.
//! Responses are simplified: global IDs become plain IDs and `nodes`
//! connections become arrays.

use crate::catalog::Entity;
use crate::error::{GitLabError, ToolError};
use crate::tools::EntityRegistry;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use crate::util::{simplify_graphql, to_gid, truncate_text};
use async_trait::async_trait;
use gitlab_mcp_macros::gitlab_tool;
use serde_json::{Value, json};

/// Descriptions longer than this are cut in responses
const MAX_DESCRIPTION_CHARS: usize = 8_000;

const LIST_QUERY: &str = r#"
query($fullPath: ID!, $types: [IssueType!], $state: IssuableState, $first: Int, $after: String) {
  namespace(fullPath: $fullPath) {
    workItems(types: $types, state: $state, first: $first, after: $after) {
      nodes {
        id iid title state webUrl createdAt updatedAt
        workItemType { name }
        author { username }
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

const GET_QUERY: &str = r#"
query($id: WorkItemID!) {
  workItem(id: $id) {
    id iid title description state webUrl createdAt updatedAt closedAt
    workItemType { name }
    author { username }
    widgets {
      type
      ... on WorkItemWidgetAssignees { assignees { nodes { username } } }
      ... on WorkItemWidgetLabels { labels { nodes { title } } }
      ... on WorkItemWidgetMilestone { milestone { id title } }
      ... on WorkItemWidgetHierarchy { parent { id title } }
    }
  }
}"#;

const TYPES_QUERY: &str = r#"
query($fullPath: ID!, $name: IssueType) {
  namespace(fullPath: $fullPath) {
    workItemTypes(name: $name) { nodes { id name } }
  }
}"#;

const CREATE_MUTATION: &str = r#"
mutation($input: WorkItemCreateInput!) {
  workItemCreate(input: $input) {
    workItem { id iid title state webUrl workItemType { name } }
    errors
  }
}"#;

const UPDATE_MUTATION: &str = r#"
mutation($input: WorkItemUpdateInput!) {
  workItemUpdate(input: $input) {
    workItem { id iid title state webUrl }
    errors
  }
}"#;

const DELETE_MUTATION: &str = r#"
mutation($input: WorkItemDeleteInput!) {
  workItemDelete(input: $input) { errors }
}"#;

/// Read work items
#[gitlab_tool(
    name = "browse_work_items",
    description = "List work items (issues, tasks, epics, ...) of a project or group, or get one work item by ID",
    entity = "workitems"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseWorkItems {
    /// List work items of a namespace
    #[action(read)]
    List {
        /// Full path of the project or group
        namespace: String,
        /// Type filter, e.g. ["ISSUE", "TASK"]
        #[serde(default)]
        types: Vec<String>,
        /// opened, closed or all
        #[serde(default)]
        state: Option<String>,
        /// Page size (max 100)
        #[serde(default)]
        first: Option<u32>,
        /// Cursor from a previous page's endCursor
        #[serde(default)]
        after: Option<String>,
    },
    /// Get a work item
    #[action(read)]
    Get {
        /// Numeric ID or gid://gitlab/WorkItem/<id>
        id: String,
    },
}

#[async_trait]
impl ToolExecutor for BrowseWorkItems {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        match self {
            Self::List {
                namespace,
                types,
                state,
                first,
                after,
            } => {
                let types: Vec<String> = types.iter().map(|t| t.to_ascii_uppercase()).collect();
                let state = state.as_deref().filter(|s| *s != "all");
                let variables = json!({
                    "fullPath": namespace,
                    "types": if types.is_empty() { Value::Null } else { json!(types) },
                    "state": state,
                    "first": first.unwrap_or(20).min(100),
                    "after": after,
                });
                let data = ctx.gitlab.graphql(LIST_QUERY, variables).await?;
                let items = data
                    .pointer("/namespace/workItems")
                    .cloned()
                    .ok_or_else(|| {
                        ToolError::ResourceNotFound(format!("namespace '{}'", namespace))
                    })?;
                ToolOutput::json_value(simplify_graphql(items))
            }
            Self::Get { id } => {
                let data = ctx
                    .gitlab
                    .graphql(GET_QUERY, json!({ "id": to_gid("WorkItem", id) }))
                    .await?;
                let mut item = match data.get("workItem") {
                    Some(item) if !item.is_null() => simplify_graphql(item.clone()),
                    _ => return Err(ToolError::ResourceNotFound(format!("work item {}", id))),
                };
                if let Some(Value::String(description)) = item.get_mut("description") {
                    *description = truncate_text(description, MAX_DESCRIPTION_CHARS);
                }
                ToolOutput::json_value(item)
            }
        }
    }
}

/// Create, update or delete work items
#[gitlab_tool(
    name = "manage_work_item",
    description = "Create, update or delete work items (issues, tasks, epics, ...)",
    entity = "workitems"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageWorkItem {
    /// Create a work item
    #[action(write)]
    Create {
        /// Full path of the project or group
        namespace: String,
        /// Work item type name, e.g. Issue, Task, Epic
        work_item_type: String,
        title: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        confidential: bool,
    },
    /// Update a work item
    #[action(write)]
    Update {
        /// Numeric ID or gid://gitlab/WorkItem/<id>
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        /// CLOSE or REOPEN
        #[serde(default)]
        state_event: Option<String>,
    },
    /// Delete a work item
    #[action(delete)]
    Delete { id: String },
}

#[async_trait]
impl ToolExecutor for ManageWorkItem {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        match self {
            Self::Create {
                namespace,
                work_item_type,
                title,
                description,
                confidential,
            } => {
                let type_id = work_item_type_id(ctx, namespace, work_item_type).await?;
                let mut input = json!({
                    "namespacePath": namespace,
                    "workItemTypeId": type_id,
                    "title": title,
                    "confidential": confidential,
                });
                if let Some(description) = description {
                    input["descriptionWidget"] = json!({ "description": description });
                }
                let data = ctx
                    .gitlab
                    .graphql(CREATE_MUTATION, json!({ "input": input }))
                    .await?;
                let payload = mutation_payload(&data, "workItemCreate")?;
                ToolOutput::json_value(simplify_graphql(
                    payload.get("workItem").cloned().unwrap_or(Value::Null),
                ))
            }
            Self::Update {
                id,
                title,
                description,
                state_event,
            } => {
                let mut input = json!({ "id": to_gid("WorkItem", id) });
                if let Some(title) = title {
                    input["title"] = json!(title);
                }
                if let Some(description) = description {
                    input["descriptionWidget"] = json!({ "description": description });
                }
                if let Some(state_event) = state_event {
                    input["stateEvent"] = json!(state_event.to_ascii_uppercase());
                }
                let data = ctx
                    .gitlab
                    .graphql(UPDATE_MUTATION, json!({ "input": input }))
                    .await?;
                let payload = mutation_payload(&data, "workItemUpdate")?;
                ToolOutput::json_value(simplify_graphql(
                    payload.get("workItem").cloned().unwrap_or(Value::Null),
                ))
            }
            Self::Delete { id } => {
                let data = ctx
                    .gitlab
                    .graphql(
                        DELETE_MUTATION,
                        json!({ "input": { "id": to_gid("WorkItem", id) } }),
                    )
                    .await?;
                mutation_payload(&data, "workItemDelete")?;
                ToolOutput::json_value(json!({ "deleted": true, "id": id }))
            }
        }
    }
}

async fn work_item_type_id(
    ctx: &ToolContext,
    namespace: &str,
    type_name: &str,
) -> Result<String, ToolError> {
    let variables = json!({
        "fullPath": namespace,
        "name": type_name.to_ascii_uppercase(),
    });
    let data = ctx.gitlab.graphql(TYPES_QUERY, variables).await?;
    data.pointer("/namespace/workItemTypes/nodes")
        .and_then(Value::as_array)
        .and_then(|nodes| nodes.first())
        .and_then(|node| node.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ToolError::InvalidArguments(format!(
                "work item type '{}' is not available in '{}'",
                type_name, namespace
            ))
        })
}

/// Mutation payloads report failures in their own `errors` list
fn mutation_payload<'a>(data: &'a Value, field: &str) -> Result<&'a Value, ToolError> {
    let payload = data
        .get(field)
        .filter(|p| !p.is_null())
        .ok_or_else(|| GitLabError::InvalidResponse(format!("missing {} payload", field)))?;

    let errors: Vec<&str> = payload
        .get("errors")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !errors.is_empty() {
        return Err(GitLabError::GraphQL(errors.join("; ")).into());
    }
    Ok(payload)
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::WorkItems);
    registry
        .register::<BrowseWorkItems>()
        .register::<ManageWorkItem>();
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_payload_errors() {
        let data = json!({"workItemUpdate": {"workItem": null, "errors": ["Title can't be blank"]}});
        let err = mutation_payload(&data, "workItemUpdate").unwrap_err();
        assert!(err.to_string().contains("Title can't be blank"));

        let data = json!({"workItemDelete": {"errors": []}});
        assert!(mutation_payload(&data, "workItemDelete").is_ok());
        assert!(mutation_payload(&data, "workItemCreate").is_err());
    }
}
