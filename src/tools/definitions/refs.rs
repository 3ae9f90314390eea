//! Branch and tag tools

use crate::catalog::Entity;
use crate::error::ToolError;
use crate::gitlab::GitLabClient;
use crate::tools::EntityRegistry;
use crate::tools::definitions::core::insert_opt;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use crate::util::QueryBuilder;
use async_trait::async_trait;
use gitlab_mcp_macros::gitlab_tool;
use serde_json::{Value, json};

/// Read branches, tags and branch protections
#[gitlab_tool(
    name = "browse_refs",
    description = "List or get branches and tags of a repository, and list protected branches",
    entity = "refs"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseRefs {
    /// List branches
    #[action(read)]
    ListBranches {
        project_id: String,
        #[serde(default)]
        search: Option<String>,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Get a branch
    #[action(read)]
    GetBranch { project_id: String, branch: String },
    /// List tags
    #[action(read)]
    ListTags {
        project_id: String,
        #[serde(default)]
        search: Option<String>,
        /// name, updated or version
        #[serde(default)]
        order_by: Option<String>,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Get a tag
    #[action(read)]
    GetTag { project_id: String, tag_name: String },
    /// List protected branches
    #[action(read)]
    ListProtectedBranches { project_id: String },
}

#[async_trait]
impl ToolExecutor for BrowseRefs {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let endpoint = match self {
            Self::ListBranches {
                project_id,
                search,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .optional("search", search.as_deref())
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                format!("{}/branches{}", repository(project_id), query)
            }
            Self::GetBranch { project_id, branch } => format!(
                "{}/branches/{}",
                repository(project_id),
                GitLabClient::encode_path(branch)
            ),
            Self::ListTags {
                project_id,
                search,
                order_by,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .optional("search", search.as_deref())
                    .optional("order_by", order_by.as_deref())
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                format!("{}/tags{}", repository(project_id), query)
            }
            Self::GetTag {
                project_id,
                tag_name,
            } => format!(
                "{}/tags/{}",
                repository(project_id),
                GitLabClient::encode_path(tag_name)
            ),
            Self::ListProtectedBranches { project_id } => format!(
                "/projects/{}/protected_branches",
                GitLabClient::encode_path(project_id)
            ),
        };

        let result: Value = ctx.gitlab.get(&endpoint).await?;
        ToolOutput::json_value(result)
    }
}

/// Create, delete and protect branches and tags
#[gitlab_tool(
    name = "manage_ref",
    description = "Create or delete branches and tags, and protect or unprotect branches",
    entity = "refs"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageRef {
    /// Create a branch
    #[action(write)]
    CreateBranch {
        project_id: String,
        branch: String,
        /// Branch name or commit SHA to start from
        #[serde(rename = "ref")]
        ref_name: String,
    },
    /// Delete a branch
    #[action(delete)]
    DeleteBranch { project_id: String, branch: String },
    /// Protect a branch (wildcards allowed)
    #[action(write)]
    ProtectBranch {
        project_id: String,
        branch: String,
        /// 0 (no access), 30 (developer), 40 (maintainer), 60 (admin)
        #[serde(default)]
        push_access_level: Option<u32>,
        #[serde(default)]
        merge_access_level: Option<u32>,
        #[serde(default)]
        allow_force_push: Option<bool>,
    },
    /// Remove a branch protection
    #[action(delete)]
    UnprotectBranch { project_id: String, branch: String },
    /// Create a tag
    #[action(write)]
    CreateTag {
        project_id: String,
        tag_name: String,
        /// Branch name or commit SHA to tag
        #[serde(rename = "ref")]
        ref_name: String,
        /// Annotated tag message
        #[serde(default)]
        message: Option<String>,
    },
    /// Delete a tag
    #[action(delete)]
    DeleteTag { project_id: String, tag_name: String },
}

#[async_trait]
impl ToolExecutor for ManageRef {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let result: Value = match self {
            Self::CreateBranch {
                project_id,
                branch,
                ref_name,
            } => {
                let body = json!({ "branch": branch, "ref": ref_name });
                let endpoint = format!("{}/branches", repository(project_id));
                ctx.gitlab.post(&endpoint, &body).await?
            }
            Self::DeleteBranch { project_id, branch } => {
                let endpoint = format!(
                    "{}/branches/{}",
                    repository(project_id),
                    GitLabClient::encode_path(branch)
                );
                ctx.gitlab.delete(&endpoint).await?
            }
            Self::ProtectBranch {
                project_id,
                branch,
                push_access_level,
                merge_access_level,
                allow_force_push,
            } => {
                let mut body = json!({ "name": branch });
                insert_opt(&mut body, "push_access_level", *push_access_level);
                insert_opt(&mut body, "merge_access_level", *merge_access_level);
                insert_opt(&mut body, "allow_force_push", *allow_force_push);
                let endpoint = format!(
                    "/projects/{}/protected_branches",
                    GitLabClient::encode_path(project_id)
                );
                ctx.gitlab.post(&endpoint, &body).await?
            }
            Self::UnprotectBranch { project_id, branch } => {
                let endpoint = format!(
                    "/projects/{}/protected_branches/{}",
                    GitLabClient::encode_path(project_id),
                    GitLabClient::encode_path(branch)
                );
                ctx.gitlab.delete(&endpoint).await?
            }
            Self::CreateTag {
                project_id,
                tag_name,
                ref_name,
                message,
            } => {
                let mut body = json!({ "tag_name": tag_name, "ref": ref_name });
                insert_opt(&mut body, "message", message.as_deref());
                let endpoint = format!("{}/tags", repository(project_id));
                ctx.gitlab.post(&endpoint, &body).await?
            }
            Self::DeleteTag {
                project_id,
                tag_name,
            } => {
                let endpoint = format!(
                    "{}/tags/{}",
                    repository(project_id),
                    GitLabClient::encode_path(tag_name)
                );
                ctx.gitlab.delete(&endpoint).await?
            }
        };

        ToolOutput::json_value(result)
    }
}

fn repository(project_id: &str) -> String {
    format!("/projects/{}/repository", GitLabClient::encode_path(project_id))
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::Refs);
    registry.register::<BrowseRefs>().register::<ManageRef>();
    registry
}
