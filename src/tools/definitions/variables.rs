//! CI/CD variable tools
//!
//! Variables live on projects and groups; the namespace scope is resolved per
//! call.

use crate::catalog::Entity;
use crate::error::ToolError;
use crate::gitlab::{GitLabClient, resolve_namespace};
use crate::tools::EntityRegistry;
use crate::tools::definitions::core::insert_opt;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use crate::util::QueryBuilder;
use async_trait::async_trait;
use gitlab_mcp_macros::gitlab_tool;
use serde_json::{Value, json};

/// Read CI/CD variables
#[gitlab_tool(
    name = "browse_variables",
    description = "List CI/CD variables of a project or group, or get one variable by key",
    entity = "variables"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseVariables {
    /// List variables
    #[action(read)]
    List {
        /// Project or group ID or path
        namespace: String,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Get a variable
    #[action(read)]
    Get {
        namespace: String,
        key: String,
        /// Environment scope, for projects with scoped variables
        #[serde(default)]
        environment_scope: Option<String>,
    },
}

#[async_trait]
impl ToolExecutor for BrowseVariables {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let (namespace, suffix) = match self {
            Self::List {
                namespace,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                (namespace, format!("variables{}", query))
            }
            Self::Get {
                namespace,
                key,
                environment_scope,
            } => (namespace, variable_suffix(key, environment_scope.as_deref())),
        };

        let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
        let result: Value = ctx.gitlab.get(&ns.path(&suffix)).await?;
        ToolOutput::json_value(result)
    }
}

/// Create, update or delete CI/CD variables
#[gitlab_tool(
    name = "manage_variable",
    description = "Create, update or delete CI/CD variables of a project or group",
    entity = "variables"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageVariable {
    /// Create a variable
    #[action(write)]
    Create {
        namespace: String,
        key: String,
        value: String,
        /// env_var (default) or file
        #[serde(default)]
        variable_type: Option<String>,
        #[serde(default)]
        protected: Option<bool>,
        #[serde(default)]
        masked: Option<bool>,
        /// Expand `$VAR` references (default true)
        #[serde(default)]
        raw: Option<bool>,
        #[serde(default)]
        environment_scope: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    /// Update a variable
    #[action(write)]
    Update {
        namespace: String,
        key: String,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        variable_type: Option<String>,
        #[serde(default)]
        protected: Option<bool>,
        #[serde(default)]
        masked: Option<bool>,
        #[serde(default)]
        raw: Option<bool>,
        /// Scope of the variable to update
        #[serde(default)]
        environment_scope: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    /// Delete a variable
    #[action(delete)]
    Delete {
        namespace: String,
        key: String,
        #[serde(default)]
        environment_scope: Option<String>,
    },
}

#[async_trait]
impl ToolExecutor for ManageVariable {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let result: Value = match self {
            Self::Create {
                namespace,
                key,
                value,
                variable_type,
                protected,
                masked,
                raw,
                environment_scope,
                description,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let mut body = json!({ "key": key, "value": value });
                insert_opt(&mut body, "variable_type", variable_type.as_deref());
                insert_opt(&mut body, "protected", *protected);
                insert_opt(&mut body, "masked", *masked);
                insert_opt(&mut body, "raw", *raw);
                insert_opt(&mut body, "environment_scope", environment_scope.as_deref());
                insert_opt(&mut body, "description", description.as_deref());
                ctx.gitlab.post(&ns.path("variables"), &body).await?
            }
            Self::Update {
                namespace,
                key,
                value,
                variable_type,
                protected,
                masked,
                raw,
                environment_scope,
                description,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let mut body = json!({});
                insert_opt(&mut body, "value", value.as_deref());
                insert_opt(&mut body, "variable_type", variable_type.as_deref());
                insert_opt(&mut body, "protected", *protected);
                insert_opt(&mut body, "masked", *masked);
                insert_opt(&mut body, "raw", *raw);
                insert_opt(&mut body, "description", description.as_deref());
                let suffix = variable_suffix(key, environment_scope.as_deref());
                ctx.gitlab.put(&ns.path(&suffix), &body).await?
            }
            Self::Delete {
                namespace,
                key,
                environment_scope,
            } => {
                let ns = resolve_namespace(&ctx.gitlab, namespace).await?;
                let suffix = variable_suffix(key, environment_scope.as_deref());
                ctx.gitlab.delete(&ns.path(&suffix)).await?
            }
        };

        ToolOutput::json_value(result)
    }
}

/// `variables/<key>` with the optional `filter[environment_scope]`
fn variable_suffix(key: &str, environment_scope: Option<&str>) -> String {
    let query = QueryBuilder::new()
        .optional("filter[environment_scope]", environment_scope)
        .build();
    format!("variables/{}{}", GitLabClient::encode_path(key), query)
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::Variables);
    registry
        .register::<BrowseVariables>()
        .register::<ManageVariable>();
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_suffix() {
        assert_eq!(variable_suffix("API_KEY", None), "variables/API_KEY");
        assert_eq!(
            variable_suffix("API_KEY", Some("production")),
            "variables/API_KEY?filter[environment_scope]=production"
        );
    }
}
