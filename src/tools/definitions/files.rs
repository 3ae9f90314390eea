//! Repository file tools

use crate::catalog::Entity;
use crate::error::ToolError;
use crate::gitlab::{FileContent, GitLabClient};
use crate::tools::EntityRegistry;
use crate::tools::definitions::core::insert_opt;
use crate::tools::executor::{ToolContext, ToolExecutor, ToolOutput};
use crate::util::{QueryBuilder, truncate_text};
use async_trait::async_trait;
use base64::Engine;
use gitlab_mcp_macros::gitlab_tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Decoded file contents longer than this are cut
const MAX_FILE_CHARS: usize = 100_000;

/// Read the repository tree and file contents
#[gitlab_tool(
    name = "browse_files",
    description = "Browse a repository: list a directory tree, read a text file, or download a file (images are returned as image content)",
    entity = "files"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowseFiles {
    /// List files and directories
    #[action(read)]
    Tree {
        project_id: String,
        /// Directory inside the repository; root when omitted
        #[serde(default)]
        path: Option<String>,
        /// Branch, tag or commit
        #[serde(default, rename = "ref")]
        ref_name: Option<String>,
        #[serde(default)]
        recursive: bool,
        #[serde(default)]
        per_page: Option<u32>,
        #[serde(default)]
        page: Option<u32>,
    },
    /// Read a file as text
    #[action(read)]
    Content {
        project_id: String,
        file_path: String,
        /// Branch, tag or commit (default branch when omitted)
        #[serde(default, rename = "ref")]
        ref_name: Option<String>,
    },
    /// Download a raw file
    #[action(read)]
    Download {
        project_id: String,
        file_path: String,
        #[serde(default, rename = "ref")]
        ref_name: Option<String>,
    },
}

#[async_trait]
impl ToolExecutor for BrowseFiles {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        match self {
            Self::Tree {
                project_id,
                path,
                ref_name,
                recursive,
                per_page,
                page,
            } => {
                let query = QueryBuilder::new()
                    .optional("path", path.as_deref())
                    .optional("ref", ref_name.as_deref())
                    .flag("recursive", *recursive)
                    .optional("per_page", per_page.map(|p| p.min(100)))
                    .optional("page", *page)
                    .build();
                let endpoint = format!(
                    "/projects/{}/repository/tree{}",
                    GitLabClient::encode_path(project_id),
                    query
                );
                let result: Value = ctx.gitlab.get(&endpoint).await?;
                ToolOutput::json_value(result)
            }
            Self::Content {
                project_id,
                file_path,
                ref_name,
            } => {
                let endpoint = format!(
                    "{}{}",
                    file_endpoint(project_id, file_path),
                    ref_query(ctx, project_id, ref_name.as_deref()).await?
                );
                let file: FileContent = ctx.gitlab.get(&endpoint).await?;
                let text = decode_content(&file)?;
                ToolOutput::json_value(json!({
                    "file_path": file.file_path,
                    "ref": file.ref_name,
                    "size": file.size,
                    "blob_id": file.blob_id,
                    "last_commit_id": file.last_commit_id,
                    "content": truncate_text(&text, MAX_FILE_CHARS),
                }))
            }
            Self::Download {
                project_id,
                file_path,
                ref_name,
            } => {
                let endpoint = format!(
                    "{}/raw{}",
                    file_endpoint(project_id, file_path),
                    ref_query(ctx, project_id, ref_name.as_deref()).await?
                );
                let (bytes, content_type) = ctx.gitlab.get_bytes(&endpoint).await?;
                Ok(download_output(file_path, bytes, content_type.as_deref()))
            }
        }
    }
}

/// One change of a multi-file commit
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommitAction {
    /// create, update, delete, move or chmod
    pub action: String,
    pub file_path: String,
    /// Original path, for move
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// text (default) or base64
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// Write repository files
#[gitlab_tool(
    name = "manage_files",
    description = "Create, update or delete a single repository file, or commit several file changes at once",
    entity = "files"
)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManageFiles {
    /// Create a file
    #[action(write)]
    Create {
        project_id: String,
        file_path: String,
        branch: String,
        content: String,
        commit_message: String,
        /// text (default) or base64
        #[serde(default)]
        encoding: Option<String>,
        /// Create `branch` from this branch first
        #[serde(default)]
        start_branch: Option<String>,
    },
    /// Replace a file's content
    #[action(write)]
    Update {
        project_id: String,
        file_path: String,
        branch: String,
        content: String,
        commit_message: String,
        #[serde(default)]
        encoding: Option<String>,
        /// Blob SHA the change is based on, to detect conflicts
        #[serde(default)]
        last_commit_id: Option<String>,
    },
    /// Delete a file
    #[action(delete)]
    Delete {
        project_id: String,
        file_path: String,
        branch: String,
        commit_message: String,
    },
    /// Commit several changes
    #[action(write)]
    Commit {
        project_id: String,
        branch: String,
        commit_message: String,
        actions: Vec<CommitAction>,
        #[serde(default)]
        start_branch: Option<String>,
    },
}

#[async_trait]
impl ToolExecutor for ManageFiles {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let result: Value = match self {
            Self::Create {
                project_id,
                file_path,
                branch,
                content,
                commit_message,
                encoding,
                start_branch,
            } => {
                let mut body = json!({
                    "branch": branch,
                    "content": content,
                    "commit_message": commit_message,
                });
                insert_opt(&mut body, "encoding", encoding.as_deref());
                insert_opt(&mut body, "start_branch", start_branch.as_deref());
                ctx.gitlab
                    .post(&file_endpoint(project_id, file_path), &body)
                    .await?
            }
            Self::Update {
                project_id,
                file_path,
                branch,
                content,
                commit_message,
                encoding,
                last_commit_id,
            } => {
                let mut body = json!({
                    "branch": branch,
                    "content": content,
                    "commit_message": commit_message,
                });
                insert_opt(&mut body, "encoding", encoding.as_deref());
                insert_opt(&mut body, "last_commit_id", last_commit_id.as_deref());
                ctx.gitlab
                    .put(&file_endpoint(project_id, file_path), &body)
                    .await?
            }
            Self::Delete {
                project_id,
                file_path,
                branch,
                commit_message,
            } => {
                let query = QueryBuilder::new()
                    .param("branch", branch)
                    .param("commit_message", commit_message)
                    .build();
                ctx.gitlab
                    .delete(&format!("{}{}", file_endpoint(project_id, file_path), query))
                    .await?
            }
            Self::Commit {
                project_id,
                branch,
                commit_message,
                actions,
                start_branch,
            } => {
                if actions.is_empty() {
                    return Err(ToolError::InvalidArguments(
                        "a commit needs at least one action".into(),
                    ));
                }
                let mut body = json!({
                    "branch": branch,
                    "commit_message": commit_message,
                    "actions": actions,
                });
                insert_opt(&mut body, "start_branch", start_branch.as_deref());
                let endpoint = format!(
                    "/projects/{}/repository/commits",
                    GitLabClient::encode_path(project_id)
                );
                ctx.gitlab.post(&endpoint, &body).await?
            }
        };

        ToolOutput::json_value(result)
    }
}

fn file_endpoint(project_id: &str, file_path: &str) -> String {
    format!(
        "/projects/{}/repository/files/{}",
        GitLabClient::encode_path(project_id),
        GitLabClient::encode_path(file_path)
    )
}

/// `?ref=...`, falling back to the project's default branch
async fn ref_query(
    ctx: &ToolContext,
    project_id: &str,
    ref_name: Option<&str>,
) -> Result<String, ToolError> {
    let ref_name = match ref_name {
        Some(r) => r.to_string(),
        None => {
            let project: Value = ctx
                .gitlab
                .get(&format!("/projects/{}", GitLabClient::encode_path(project_id)))
                .await?;
            project
                .get("default_branch")
                .and_then(Value::as_str)
                .unwrap_or("HEAD")
                .to_string()
        }
    };
    Ok(QueryBuilder::new().param("ref", ref_name).build())
}

fn decode_content(file: &FileContent) -> Result<String, ToolError> {
    if file.encoding != "base64" {
        return Ok(file.content.clone());
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(file.content.replace('\n', ""))
        .map_err(|e| ToolError::ExecutionFailed(format!("invalid base64 content: {}", e)))?;
    String::from_utf8(bytes).map_err(|_| {
        ToolError::InvalidArguments(format!(
            "{} is a binary file, use the download action",
            file.file_path
        ))
    })
}

fn download_output(file_path: &str, bytes: Vec<u8>, content_type: Option<&str>) -> ToolOutput {
    let mime = content_type
        .map(|c| c.split(';').next().unwrap_or(c).trim().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    if mime.starts_with("image/") {
        return ToolOutput::image(&bytes, mime);
    }

    match String::from_utf8(bytes) {
        Ok(text) => ToolOutput::text(truncate_text(&text, MAX_FILE_CHARS)),
        Err(e) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(e.as_bytes());
            ToolOutput::text(format!(
                "{} ({}, {} bytes, base64):\n{}",
                file_path,
                mime,
                e.as_bytes().len(),
                encoded
            ))
        }
    }
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new(Entity::Files);
    registry
        .register::<BrowseFiles>()
        .register::<ManageFiles>();
    registry
}
