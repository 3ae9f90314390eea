//! GitLab API response types
//!
//! Most tools pass GitLab's JSON through as `serde_json::Value`; these are the
//! payloads the server itself inspects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /metadata`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceMetadata {
    pub version: String,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub enterprise: bool,
}

/// `GET /license` (admin only on self-managed EE)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub expired: bool,
}

/// `GET /projects/:id/repository/files/:path`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub file_name: String,
    pub file_path: String,
    pub size: u64,
    pub encoding: String,
    pub content: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub blob_id: String,
    #[serde(default)]
    pub last_commit_id: Option<String>,
}

/// Envelope of a GraphQL response
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQLErrorEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLErrorEntry {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graphql_response_with_errors() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "errors": [{"message": "Field 'foo' doesn't exist", "locations": []}]
        }))
        .unwrap();

        assert!(response.data.is_none());
        assert_eq!(response.errors.unwrap()[0].message, "Field 'foo' doesn't exist");
    }

    #[test]
    fn test_file_content_ref_rename() {
        let file: FileContent = serde_json::from_value(json!({
            "file_name": "README.md",
            "file_path": "docs/README.md",
            "size": 5,
            "encoding": "base64",
            "content": "aGVsbG8=",
            "ref": "main",
            "blob_id": "abc",
            "commit_id": "def"
        }))
        .unwrap();

        assert_eq!(file.ref_name, "main");
        assert!(file.last_commit_id.is_none());
    }
}
