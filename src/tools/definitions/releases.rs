//! Release tools

use crate::catalog::Entity;
use crate::error::ToolError;
use crate::gitlab::GitLabClient;
use crate::tools::EntityRegistry;
use crate::tools::definitions::core::insert_opt;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use crate::util::QueryBuilder;
use async_trait::async_trait;
use gitlab_mcp_macros::gitlab_tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Read project releases
#[gitlab_tool(
    name = "browse_releases",
    description = "List releases of a project or get one release by tag name",
    entity = "releases"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseReleases {
    /// List releases, newest first
    #[action(read)]
    List {
        project_id: String,
        /// released_at or created_at
        #[serde(default)]
        order_by: Option<String>,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Get a release by tag
    #[action(read)]
    Get { project_id: String, tag_name: String },
}

#[async_trait]
impl ToolExecutor for BrowseReleases {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let endpoint = match self {
            Self::List {
                project_id,
                order_by,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .optional("order_by", order_by.as_deref())
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                format!(
                    "/projects/{}/releases{}",
                    GitLabClient::encode_path(project_id),
                    query
                )
            }
            Self::Get {
                project_id,
                tag_name,
            } => release_path(project_id, tag_name),
        };

        let result: Value = ctx.gitlab.get(&endpoint).await?;
        ToolOutput::json_value(result)
    }
}

/// An asset link attached to a release
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReleaseLinkInput {
    pub name: String,
    pub url: String,
    /// other, runbook, image or package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

/// Create, update and delete releases and their asset links
#[gitlab_tool(
    name = "manage_release",
    description = "Create, update or delete project releases and manage their asset links",
    entity = "releases"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageRelease {
    /// Create a release for a tag (the tag is created from `ref` if missing)
    #[action(write)]
    Create {
        project_id: String,
        tag_name: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
        /// Commit SHA or branch used when the tag does not exist yet
        #[serde(default, rename = "ref")]
        ref_name: Option<String>,
        #[serde(default)]
        milestones: Vec<String>,
        #[serde(default)]
        links: Vec<ReleaseLinkInput>,
    },
    /// Update a release
    #[action(write)]
    Update {
        project_id: String,
        tag_name: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        milestones: Option<Vec<String>>,
    },
    /// Delete a release (the tag is kept)
    #[action(delete)]
    Delete { project_id: String, tag_name: String },
    /// Add an asset link
    #[action(write)]
    CreateLink {
        project_id: String,
        tag_name: String,
        /// Link title
        name: String,
        url: String,
        /// other, runbook, image or package
        #[serde(default)]
        link_type: Option<String>,
    },
    /// Remove an asset link
    #[action(delete)]
    DeleteLink {
        project_id: String,
        tag_name: String,
        link_id: u64,
    },
}

#[async_trait]
impl ToolExecutor for ManageRelease {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let result: Value = match self {
            Self::Create {
                project_id,
                tag_name,
                name,
                description,
                ref_name,
                milestones,
                links,
            } => {
                let mut body = json!({ "tag_name": tag_name });
                insert_opt(&mut body, "name", name.as_deref());
                insert_opt(&mut body, "description", description.as_deref());
                insert_opt(&mut body, "ref", ref_name.as_deref());
                if !milestones.is_empty() {
                    body["milestones"] = json!(milestones);
                }
                if !links.is_empty() {
                    body["assets"] = json!({ "links": links });
                }
                let endpoint = format!(
                    "/projects/{}/releases",
                    GitLabClient::encode_path(project_id)
                );
                ctx.gitlab.post(&endpoint, &body).await?
            }
            Self::Update {
                project_id,
                tag_name,
                name,
                description,
                milestones,
            } => {
                let mut body = json!({});
                insert_opt(&mut body, "name", name.as_deref());
                insert_opt(&mut body, "description", description.as_deref());
                insert_opt(&mut body, "milestones", milestones.as_ref());
                ctx.gitlab
                    .put(&release_path(project_id, tag_name), &body)
                    .await?
            }
            Self::Delete {
                project_id,
                tag_name,
            } => ctx.gitlab.delete(&release_path(project_id, tag_name)).await?,
            Self::CreateLink {
                project_id,
                tag_name,
                name,
                url,
                link_type,
            } => {
                let link = ReleaseLinkInput {
                    name: name.clone(),
                    url: url.clone(),
                    link_type: link_type.clone(),
                };
                let endpoint = format!("{}/assets/links", release_path(project_id, tag_name));
                ctx.gitlab.post(&endpoint, &link).await?
            }
            Self::DeleteLink {
                project_id,
                tag_name,
                link_id,
            } => {
                let endpoint = format!(
                    "{}/assets/links/{}",
                    release_path(project_id, tag_name),
                    link_id
                );
                ctx.gitlab.delete(&endpoint).await?
            }
        };

        ToolOutput::json_value(result)
    }
}

fn release_path(project_id: &str, tag_name: &str) -> String {
    format!(
        "/projects/{}/releases/{}",
        GitLabClient::encode_path(project_id),
        GitLabClient::encode_path(tag_name)
    )
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::Releases);
    registry
        .register::<BrowseReleases>()
        .register::<ManageRelease>();
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_path_encodes_tag() {
        assert_eq!(
            release_path("group/app", "v1.0/rc"),
            "/projects/group%2Fapp/releases/v1.0%2Frc"
        );
    }

    #[test]
    fn test_create_link_fields() {
        let tool: ManageRelease = serde_json::from_value(json!({
            "action": "create_link",
            "project_id": "1",
            "tag_name": "v1",
            "name": "binary",
            "url": "https://example.com/bin"
        }))
        .unwrap();
        match tool {
            ManageRelease::CreateLink { name, link_type, .. } => {
                assert_eq!(name, "binary");
                assert!(link_type.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
