//! Project-or-group namespace resolution
//!
//! Several GitLab resources (milestones, variables, webhooks, releases on
//! groups) exist under both `projects/:id` and `groups/:id`. Callers pass a
//! single `namespace` argument; we probe the project resource and fall back to
//! the group-scoped path when it 404s.

use crate::error::{GitLabResult, ToolError, ToolResult};
use crate::gitlab::GitLabClient;
use serde_json::Value;
use tracing::debug;

/// Which API tree a namespace lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceScope {
    Project,
    Group,
}

impl NamespaceScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceScope::Project => "project",
            NamespaceScope::Group => "group",
        }
    }

    fn collection(&self) -> &'static str {
        match self {
            NamespaceScope::Project => "projects",
            NamespaceScope::Group => "groups",
        }
    }
}

/// A namespace with its scope decided and its path URL-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNamespace {
    pub scope: NamespaceScope,
    pub encoded: String,
}

impl ResolvedNamespace {
    pub fn project(namespace: &str) -> Self {
        Self {
            scope: NamespaceScope::Project,
            encoded: GitLabClient::encode_path(namespace),
        }
    }

    pub fn group(namespace: &str) -> Self {
        Self {
            scope: NamespaceScope::Group,
            encoded: GitLabClient::encode_path(namespace),
        }
    }

    /// `/projects/<enc>/<suffix>` or `/groups/<enc>/<suffix>`
    pub fn path(&self, suffix: &str) -> String {
        let suffix = suffix.trim_start_matches('/');
        if suffix.is_empty() {
            format!("/{}/{}", self.scope.collection(), self.encoded)
        } else {
            format!("/{}/{}/{}", self.scope.collection(), self.encoded, suffix)
        }
    }
}

/// Probe `GET /projects/:id`; a 404 means the namespace is treated as a group.
///
/// The group is not probed: the caller's group-scoped request reports its own
/// 404 if the group does not exist either.
pub async fn resolve_namespace(
    client: &GitLabClient,
    namespace: &str,
) -> GitLabResult<ResolvedNamespace> {
    let project = ResolvedNamespace::project(namespace);
    match client.get::<Value>(&project.path("")).await {
        Ok(_) => Ok(project),
        Err(e) if e.is_not_found() => {
            debug!(namespace, "Not a project, using group scope");
            Ok(ResolvedNamespace::group(namespace))
        }
        Err(e) => Err(e),
    }
}

/// Full project-then-group check, returning the entity found
pub async fn verify_namespace(
    client: &GitLabClient,
    namespace: &str,
) -> ToolResult<(NamespaceScope, Value)> {
    let project = ResolvedNamespace::project(namespace);
    match client.get::<Value>(&project.path("")).await {
        Ok(value) => return Ok((NamespaceScope::Project, value)),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }

    let group = ResolvedNamespace::group(namespace);
    match client.get::<Value>(&group.path("")).await {
        Ok(value) => Ok((NamespaceScope::Group, value)),
        Err(e) if e.is_not_found() => Err(ToolError::ResourceNotFound(format!(
            "namespace '{}' is neither a project nor a group",
            namespace
        ))),
        Err(e) => Err(e.into()),
    }
}
