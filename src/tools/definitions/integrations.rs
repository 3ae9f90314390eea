//! Project integration tools (Slack, Jira, ...)

use crate::catalog::Entity;
use crate::error::ToolError;
use crate::gitlab::GitLabClient;
use crate::tools::EntityRegistry;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use async_trait::async_trait;
use gitlab_mcp_macros::gitlab_tool;
use serde_json::{Map, Value};

/// List integrations of a project
#[gitlab_tool(
    name = "list_integrations",
    description = "List the integrations (Slack, Jira, ...) configured on a project",
    entity = "integrations",
    operation = "read"
)]
pub struct ListIntegrations {
    /// Project ID or path
    pub project_id: String,
}

#[async_trait]
impl ToolExecutor for ListIntegrations {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let endpoint = format!(
            "/projects/{}/integrations",
            GitLabClient::encode_path(&self.project_id)
        );
        let result: Value = ctx.gitlab.get(&endpoint).await?;
        ToolOutput::json_value(result)
    }
}

/// Inspect, configure or disable one integration
#[gitlab_tool(
    name = "manage_integration",
    description = "Get, update or disable a project integration identified by its slug (e.g. slack, jira)",
    entity = "integrations"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageIntegration {
    /// Get integration settings
    #[action(read)]
    Get {
        project_id: String,
        /// Integration slug, e.g. slack, jira, microsoft-teams
        integration: String,
    },
    /// Create or update integration settings
    #[action(write)]
    Update {
        project_id: String,
        integration: String,
        /// Integration specific settings, sent as-is
        #[serde(default)]
        settings: Map<String, Value>,
    },
    /// Disable an integration
    #[action(delete)]
    Disable {
        project_id: String,
        integration: String,
    },
}

#[async_trait]
impl ToolExecutor for ManageIntegration {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let result: Value = match self {
            Self::Get {
                project_id,
                integration,
            } => ctx.gitlab.get(&integration_path(project_id, integration)).await?,
            Self::Update {
                project_id,
                integration,
                settings,
            } => {
                ctx.gitlab
                    .put(&integration_path(project_id, integration), settings)
                    .await?
            }
            Self::Disable {
                project_id,
                integration,
            } => {
                ctx.gitlab
                    .delete(&integration_path(project_id, integration))
                    .await?
            }
        };

        ToolOutput::json_value(result)
    }
}

fn integration_path(project_id: &str, integration: &str) -> String {
    format!(
        "/projects/{}/integrations/{}",
        GitLabClient::encode_path(project_id),
        GitLabClient::encode_path(integration)
    )
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::Integrations);
    registry
        .register::<ListIntegrations>()
        .register::<ManageIntegration>();
    registry
}
