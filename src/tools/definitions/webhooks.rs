//! Webhook tools

use crate::catalog::Entity;
use crate::error::ToolError;
use crate::gitlab::resolve_namespace;
use crate::tools::EntityRegistry;
use crate::tools::definitions::core::insert_opt;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use crate::util::QueryBuilder;
use async_trait::async_trait;
use gitlab_mcp_macros::gitlab_tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

/// List webhooks of a project or group
#[gitlab_tool(
    name = "list_webhooks",
    description = "List the webhooks configured on a project or group",
    entity = "webhooks",
    operation = "read"
)]
pub struct ListWebhooks {
    /// Project or group ID or path
    pub namespace: String,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
}

#[async_trait]
impl ToolExecutor for ListWebhooks {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let ns = resolve_namespace(&ctx.gitlab, &self.namespace).await?;
        let query = QueryBuilder::new()
            .optional("per_page", self.per_page.map(|p| p.min(100)))
            .optional("page", self.page)
            .build();
        let result: Value = ctx.gitlab.get(&ns.path(&format!("hooks{}", query))).await?;
        ToolOutput::json_value(result)
    }
}

/// Event subscriptions of a hook; unset events keep their current value
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct WebhookEvents {
    #[serde(default)]
    pub push_events: Option<bool>,
    #[serde(default)]
    pub tag_push_events: Option<bool>,
    #[serde(default)]
    pub issues_events: Option<bool>,
    #[serde(default)]
    pub merge_requests_events: Option<bool>,
    #[serde(default)]
    pub note_events: Option<bool>,
    #[serde(default)]
    pub pipeline_events: Option<bool>,
    #[serde(default)]
    pub job_events: Option<bool>,
    #[serde(default)]
    pub releases_events: Option<bool>,
}

impl WebhookEvents {
    fn apply(&self, body: &mut Value) {
        insert_opt(body, "push_events", self.push_events);
        insert_opt(body, "tag_push_events", self.tag_push_events);
        insert_opt(body, "issues_events", self.issues_events);
        insert_opt(body, "merge_requests_events", self.merge_requests_events);
        insert_opt(body, "note_events", self.note_events);
        insert_opt(body, "pipeline_events", self.pipeline_events);
        insert_opt(body, "job_events", self.job_events);
        insert_opt(body, "releases_events", self.releases_events);
    }
}

/// Create, update, delete or test webhooks
#[gitlab_tool(
    name = "manage_webhook",
    description = "Create, update, delete or trigger a test delivery of a project or group webhook",
    entity = "webhooks"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageWebhook {
    /// Create a webhook
    #[action(write)]
    Create {
        namespace: String,
        url: String,
        /// Secret sent in the X-Gitlab-Token header
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        enable_ssl_verification: Option<bool>,
        #[serde(default)]
        events: WebhookEvents,
    },
    /// Update a webhook
    #[action(write)]
    Update {
        namespace: String,
        hook_id: u64,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        enable_ssl_verification: Option<bool>,
        #[serde(default)]
        events: WebhookEvents,
    },
    /// Delete a webhook
    #[action(delete)]
    Delete { namespace: String, hook_id: u64 },
    /// Send a test event to a webhook
    #[action(execute)]
    Test {
        namespace: String,
        hook_id: u64,
        /// Event to simulate, e.g. push_events
        #[serde(default = "default_test_trigger")]
        trigger: String,
    },
}

fn default_test_trigger() -> String {
    "push_events".to_string()
}

#[async_trait]
impl ToolExecutor for ManageWebhook {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let result: Value = match self {
            Self::Create {
                namespace,
                url,
                token,
                enable_ssl_verification,
                events,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let mut body = json!({ "url": url });
                insert_opt(&mut body, "token", token.as_deref());
                insert_opt(&mut body, "enable_ssl_verification", *enable_ssl_verification);
                events.apply(&mut body);
                ctx.gitlab.post(&ns.path("hooks"), &body).await?
            }
            Self::Update {
                namespace,
                hook_id,
                url,
                token,
                enable_ssl_verification,
                events,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let mut body = json!({});
                insert_opt(&mut body, "url", url.as_deref());
                insert_opt(&mut body, "token", token.as_deref());
                insert_opt(&mut body, "enable_ssl_verification", *enable_ssl_verification);
                events.apply(&mut body);
                ctx.gitlab
                    .put(&ns.path(&format!("hooks/{}", hook_id)), &body)
                    .await?
            }
            Self::Delete { namespace, hook_id } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                ctx.gitlab.delete(&ns.path(&format!("hooks/{}", hook_id))).await?
            }
            Self::Test {
                namespace,
                hook_id,
                trigger,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let path = ns.path(&format!("hooks/{}/test/{}", hook_id, trigger));
                ctx.gitlab.post(&path, &json!({})).await?
            }
        };

        ToolOutput::json_value(result)
    }
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::Webhooks);
    registry
        .register::<ListWebhooks>()
        .register::<ManageWebhook>();
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionScoped, OperationType};

    #[test]
    fn test_events_only_set_fields() {
        let events = WebhookEvents {
            push_events: Some(true),
            note_events: Some(false),
            ..Default::default()
        };
        let mut body = json!({"url": "https://hooks.example.com"});
        events.apply(&mut body);
        assert_eq!(
            body,
            json!({"url": "https://hooks.example.com", "push_events": true, "note_events": false})
        );
    }

    #[test]
    fn test_test_action_is_execute() {
        let tool: ManageWebhook = serde_json::from_value(json!({
            "action": "test",
            "namespace": "group/app",
            "hook_id": 9
        }))
        .unwrap();
        assert_eq!(tool.operation(), OperationType::Execute);
        assert!(matches!(tool, ManageWebhook::Test { ref trigger, .. } if trigger == "push_events"));
    }
}
