//! Core tools
//!
//! Projects, namespaces, commits, users and groups. Always available.

use crate::catalog::Entity;
use crate::error::ToolError;
use crate::gitlab::{GitLabClient, verify_namespace};
use crate::tools::EntityRegistry;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use crate::util::QueryBuilder;
use async_trait::async_trait;
use gitlab_mcp_macros::gitlab_tool;
use serde_json::{Map, Value, json};

/// Find, list or inspect projects
#[gitlab_tool(
    name = "browse_projects",
    description = "Search, list or get GitLab projects. Use 'search' to find projects by name, 'list' for projects visible to you or in a group, 'get' for one project by ID or path.",
    entity = "core"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseProjects {
    /// Search projects by name
    #[action(read)]
    Search {
        /// Search term
        search: String,
        /// Only projects you are a member of
        #[serde(default)]
        membership: bool,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// List accessible projects, or the projects of a group
    #[action(read)]
    List {
        /// Group ID or path; lists that group's projects when set
        #[serde(default)]
        group_id: Option<String>,
        /// Only projects owned by the current user
        #[serde(default)]
        owned: bool,
        /// Only starred projects
        #[serde(default)]
        starred: bool,
        /// public, internal or private
        #[serde(default)]
        visibility: Option<String>,
        /// id, name, path, created_at, updated_at or last_activity_at
        #[serde(default)]
        order_by: Option<String>,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Get one project
    #[action(read)]
    Get {
        /// Project ID or URL-encoded path (e.g. "group/project")
        project_id: String,
        /// Include repository and storage statistics
        #[serde(default)]
        statistics: bool,
    },
}

#[async_trait]
impl ToolExecutor for BrowseProjects {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let endpoint = match self {
            Self::Search {
                search,
                membership,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .param("search", search)
                    .flag("membership", *membership)
                    .param("simple", true)
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                format!("/projects{}", query)
            }
            Self::List {
                group_id,
                owned,
                starred,
                visibility,
                order_by,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .flag("owned", *owned)
                    .flag("starred", *starred)
                    .optional("visibility", visibility.as_deref())
                    .optional("order_by", order_by.as_deref())
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                match group_id {
                    Some(group) => format!(
                        "/groups/{}/projects{}",
                        GitLabClient::encode_path(group),
                        query
                    ),
                    None => format!("/projects{}", query),
                }
            }
            Self::Get {
                project_id,
                statistics,
            } => {
                let query = QueryBuilder::new().flag("statistics", *statistics).build();
                format!("/projects/{}{}", GitLabClient::encode_path(project_id), query)
            }
        };

        let result: Value = ctx.gitlab.get(&endpoint).await?;
        ToolOutput::json_value(result)
    }
}

/// Namespaces (users and groups)
#[gitlab_tool(
    name = "browse_namespaces",
    description = "List or get namespaces, or verify whether a path is a project or a group",
    entity = "core"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseNamespaces {
    /// List namespaces visible to the current user
    #[action(read)]
    List {
        #[serde(default)]
        search: Option<String>,
        /// Only namespaces the user owns
        #[serde(default)]
        owned_only: bool,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Get a namespace by ID or path
    #[action(read)]
    Get {
        /// Namespace ID or full path
        namespace: String,
    },
    /// Check whether a path is a project or a group
    #[action(read)]
    Verify {
        /// Project or group ID or full path
        namespace: String,
    },
}

#[async_trait]
impl ToolExecutor for BrowseNamespaces {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        match self {
            Self::List {
                search,
                owned_only,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .optional("search", search.as_deref())
                    .flag("owned_only", *owned_only)
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                let result: Value = ctx.gitlab.get(&format!("/namespaces{}", query)).await?;
                ToolOutput::json_value(result)
            }
            Self::Get { namespace } => {
                let endpoint = format!("/namespaces/{}", GitLabClient::encode_path(namespace));
                let result: Value = ctx.gitlab.get(&endpoint).await?;
                ToolOutput::json_value(result)
            }
            Self::Verify { namespace } => {
                let (scope, found) = verify_namespace(&ctx.gitlab, namespace).await?;
                let full_path = found
                    .get("path_with_namespace")
                    .or_else(|| found.get("full_path"))
                    .cloned()
                    .unwrap_or(Value::Null);
                ToolOutput::json_value(json!({
                    "exists": true,
                    "type": scope.as_str(),
                    "id": found.get("id").cloned().unwrap_or(Value::Null),
                    "full_path": full_path,
                    "web_url": found.get("web_url").cloned().unwrap_or(Value::Null),
                }))
            }
        }
    }
}

/// Repository commits
#[gitlab_tool(
    name = "browse_commits",
    description = "List commits of a project, get one commit, or show a commit's diff",
    entity = "core"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseCommits {
    /// List commits
    #[action(read)]
    List {
        /// Project ID or path
        project_id: String,
        /// Branch, tag or revision range
        #[serde(default)]
        ref_name: Option<String>,
        /// Only commits after this ISO 8601 date
        #[serde(default)]
        since: Option<String>,
        /// Only commits before this ISO 8601 date
        #[serde(default)]
        until: Option<String>,
        /// Only commits touching this file path
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        author: Option<String>,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Get a single commit
    #[action(read)]
    Get {
        project_id: String,
        /// Commit SHA, branch or tag
        sha: String,
        /// Include line statistics
        #[serde(default)]
        stats: bool,
    },
    /// Get the diff of a commit
    #[action(read)]
    Diff {
        project_id: String,
        sha: String,
    },
}

#[async_trait]
impl ToolExecutor for BrowseCommits {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let endpoint = match self {
            Self::List {
                project_id,
                ref_name,
                since,
                until,
                path,
                author,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .optional("ref_name", ref_name.as_deref())
                    .optional("since", since.as_deref())
                    .optional("until", until.as_deref())
                    .optional("path", path.as_deref())
                    .optional("author", author.as_deref())
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                format!(
                    "/projects/{}/repository/commits{}",
                    GitLabClient::encode_path(project_id),
                    query
                )
            }
            Self::Get {
                project_id,
                sha,
                stats,
            } => format!(
                "/projects/{}/repository/commits/{}{}",
                GitLabClient::encode_path(project_id),
                GitLabClient::encode_path(sha),
                QueryBuilder::new().flag("stats", *stats).build()
            ),
            Self::Diff { project_id, sha } => format!(
                "/projects/{}/repository/commits/{}/diff",
                GitLabClient::encode_path(project_id),
                GitLabClient::encode_path(sha)
            ),
        };

        let result: Value = ctx.gitlab.get(&endpoint).await?;
        ToolOutput::json_value(result)
    }
}

/// Create, fork or delete projects
#[gitlab_tool(
    name = "manage_project",
    description = "Create a new project, fork an existing one, or delete a project",
    entity = "core"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageProject {
    /// Create a project
    #[action(write)]
    Create {
        name: String,
        /// Repository path; derived from the name when omitted
        #[serde(default)]
        path: Option<String>,
        /// Namespace (group) ID to create the project in
        #[serde(default)]
        namespace_id: Option<u64>,
        #[serde(default)]
        description: Option<String>,
        /// public, internal or private
        #[serde(default)]
        visibility: Option<String>,
        #[serde(default)]
        initialize_with_readme: bool,
    },
    /// Fork a project
    #[action(write)]
    Fork {
        project_id: String,
        /// Target namespace path
        #[serde(default)]
        namespace_path: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        path: Option<String>,
    },
    /// Delete a project
    #[action(delete)]
    Delete { project_id: String },
}

#[async_trait]
impl ToolExecutor for ManageProject {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        match self {
            Self::Create {
                name,
                path,
                namespace_id,
                description,
                visibility,
                initialize_with_readme,
            } => {
                let mut body = json!({ "name": name });
                insert_opt(&mut body, "path", path.as_deref());
                insert_opt(&mut body, "namespace_id", *namespace_id);
                insert_opt(&mut body, "description", description.as_deref());
                insert_opt(&mut body, "visibility", visibility.as_deref());
                if *initialize_with_readme {
                    body["initialize_with_readme"] = Value::Bool(true);
                }
                let result: Value = ctx.gitlab.post("/projects", &body).await?;
                ToolOutput::json_value(result)
            }
            Self::Fork {
                project_id,
                namespace_path,
                name,
                path,
            } => {
                let mut body = json!({});
                insert_opt(&mut body, "namespace_path", namespace_path.as_deref());
                insert_opt(&mut body, "name", name.as_deref());
                insert_opt(&mut body, "path", path.as_deref());
                let endpoint = format!("/projects/{}/fork", GitLabClient::encode_path(project_id));
                let result: Value = ctx.gitlab.post(&endpoint, &body).await?;
                ToolOutput::json_value(result)
            }
            Self::Delete { project_id } => {
                let endpoint = format!("/projects/{}", GitLabClient::encode_path(project_id));
                let result = ctx.gitlab.delete(&endpoint).await?;
                ToolOutput::json_value(result)
            }
        }
    }
}

/// Look up users by username
#[gitlab_tool(
    name = "get_users",
    description = "Look up GitLab users by exact username, or search users by name or email",
    entity = "core",
    operation = "read"
)]
pub struct GetUsers {
    /// Exact usernames to resolve; unknown names map to null
    #[serde(default)]
    pub usernames: Vec<String>,
    /// Free text search, used when no usernames are given
    #[serde(default)]
    pub search: Option<String>,
}

#[async_trait]
impl ToolExecutor for GetUsers {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        if self.usernames.is_empty() {
            let Some(search) = &self.search else {
                return Err(ToolError::MissingArgument("usernames or search".into()));
            };
            let query = QueryBuilder::new().param("search", search).build();
            let result: Value = ctx.gitlab.get(&format!("/users{}", query)).await?;
            return ToolOutput::json_value(result);
        }

        let mut users = Map::new();
        for username in &self.usernames {
            let query = QueryBuilder::new().param("username", username).build();
            let found: Value = ctx.gitlab.get(&format!("/users{}", query)).await?;
            let user = found
                .as_array()
                .and_then(|list| list.first())
                .cloned()
                .unwrap_or(Value::Null);
            users.insert(username.clone(), user);
        }
        ToolOutput::json_value(Value::Object(users))
    }
}

/// Create a group or subgroup
#[gitlab_tool(
    name = "create_group",
    description = "Create a new group, or a subgroup when parent_id is given",
    entity = "core",
    operation = "write"
)]
pub struct CreateGroup {
    pub name: String,
    /// URL path of the group
    pub path: String,
    /// Parent group ID for subgroups
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    /// public, internal or private
    #[serde(default)]
    pub visibility: Option<String>,
}

#[async_trait]
impl ToolExecutor for CreateGroup {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let mut body = json!({ "name": self.name, "path": self.path });
        insert_opt(&mut body, "parent_id", self.parent_id);
        insert_opt(&mut body, "description", self.description.as_deref());
        insert_opt(&mut body, "visibility", self.visibility.as_deref());

        let result: Value = ctx.gitlab.post("/groups", &body).await?;
        ToolOutput::json_value(result)
    }
}

/// Set `body[key]` only when the value is present
pub(crate) fn insert_opt<T: serde::Serialize>(body: &mut Value, key: &str, value: Option<T>) {
    if let Some(value) = value {
        body[key] = json!(value);
    }
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::Core);
    registry
        .register::<BrowseProjects>()
        .register::<BrowseNamespaces>()
        .register::<BrowseCommits>()
        .register::<ManageProject>()
        .register::<GetUsers>()
        .register::<CreateGroup>();
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionScoped;

    #[test]
    fn test_browse_projects_parses_get() {
        let tool: BrowseProjects =
            serde_json::from_value(json!({"action": "get", "project_id": "123"})).unwrap();
        assert_eq!(tool.action(), Some("get"));
        assert!(matches!(tool, BrowseProjects::Get { statistics: false, .. }));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let err = serde_json::from_value::<BrowseProjects>(json!({"action": "archive"}));
        assert!(err.is_err());
    }

    #[test]
    fn test_insert_opt_skips_none() {
        let mut body = json!({});
        insert_opt(&mut body, "a", Some("x"));
        insert_opt(&mut body, "b", None::<&str>);
        assert_eq!(body, json!({"a": "x"}));
    }

    #[test]
    fn test_core_registry() {
        let registry = registry();
        assert_eq!(registry.len(), 6);
        let read_only = registry.read_only_tool_names();
        assert!(read_only.contains(&"browse_projects"));
        assert!(read_only.contains(&"get_users"));
        assert!(!read_only.contains(&"manage_project"));
        assert!(!read_only.contains(&"create_group"));
    }
}
