//! Built-in tools against a mocked GitLab

mod common;

use gitlab_mcp::catalog::CatalogPolicy;
use gitlab_mcp::error::{GitLabError, ToolError};
use gitlab_mcp::tools::RegistryManager;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager() -> RegistryManager {
    RegistryManager::new(CatalogPolicy::permissive())
}

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn test_browse_projects_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/123"))
        .and(header("PRIVATE-TOKEN", common::TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 123,
            "name": "test-project",
            "path_with_namespace": "group/test-project"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = common::context(common::client_for(&server));
    let output = manager()
        .dispatch(
            "browse_projects",
            &ctx,
            json!({"action": "get", "project_id": "123"}),
        )
        .await
        .unwrap();

    assert!(!output.is_error);
    assert_eq!(parse(&output.text_content())["id"], 123);
}

#[tokio::test]
async fn test_browse_projects_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "404 Project Not Found"})),
        )
        .mount(&server)
        .await;

    let ctx = common::context(common::client_for(&server));
    let err = manager()
        .dispatch(
            "browse_projects",
            &ctx,
            json!({"action": "get", "project_id": "999"}),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ToolError::GitLab(GitLabError::Api { status: 404, .. })
    ));
    let message = err.to_string();
    assert!(message.contains("404"), "{}", message);
    assert!(message.contains("Not Found"), "{}", message);
}

#[tokio::test]
async fn test_milestones_fall_back_to_group() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/test-group"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "404 Project Not Found"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/test-group/milestones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "iid": 1, "title": "Sprint 1", "group_id": 7}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = common::context(common::client_for(&server));
    let output = manager()
        .dispatch(
            "browse_milestones",
            &ctx,
            json!({"action": "list", "namespace": "test-group"}),
        )
        .await
        .unwrap();

    let milestones = parse(&output.text_content());
    assert_eq!(milestones[0]["title"], "Sprint 1");
    // expect(1) on both mocks is verified when the server drops
}

#[tokio::test]
async fn test_milestones_use_project_when_it_exists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/group%2Fapp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/group%2Fapp/milestones/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4, "title": "v1"})))
        .mount(&server)
        .await;

    let ctx = common::context(common::client_for(&server));
    let output = manager()
        .dispatch(
            "browse_milestones",
            &ctx,
            json!({"action": "get", "namespace": "group/app", "milestone_id": 4}),
        )
        .await
        .unwrap();

    assert_eq!(parse(&output.text_content())["title"], "v1");
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 1}))
                .set_delay(Duration::from_millis(1_000)),
        )
        .mount(&server)
        .await;

    let ctx = common::context(common::client_with_timeout(&server, 100));
    let err = manager()
        .dispatch(
            "browse_projects",
            &ctx,
            json!({"action": "get", "project_id": "1"}),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "API timeout after 100ms");
}

#[tokio::test]
async fn test_empty_body_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v4/projects/42/repository/tags/v1.0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = common::context(common::client_for(&server));
    let output = manager()
        .dispatch(
            "manage_ref",
            &ctx,
            json!({"action": "delete_tag", "project_id": "42", "tag_name": "v1.0"}),
        )
        .await
        .unwrap();

    assert_eq!(parse(&output.text_content()), json!({"success": true}));
}

#[tokio::test]
async fn test_read_only_integration_update_denied_get_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/42/integrations/slack"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "slug": "slack",
            "active": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let manager = RegistryManager::new(CatalogPolicy::permissive().with_read_only(true));
    let ctx = common::context(common::client_for(&server));

    let err = manager
        .dispatch(
            "manage_integration",
            &ctx,
            json!({
                "action": "update",
                "project_id": "42",
                "integration": "slack",
                "settings": {"webhook": "https://hooks.example.com"}
            }),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("read-only"), "{}", err);

    let output = manager
        .dispatch(
            "manage_integration",
            &ctx,
            json!({"action": "get", "project_id": "42", "integration": "slack"}),
        )
        .await
        .unwrap();
    assert_eq!(parse(&output.text_content())["slug"], "slack");
}

#[tokio::test]
async fn test_get_users_by_username() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .and(query_param("username", "alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "username": "alice"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .and(query_param("username", "ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let ctx = common::context(common::client_for(&server));
    let output = manager()
        .dispatch("get_users", &ctx, json!({"usernames": ["alice", "ghost"]}))
        .await
        .unwrap();

    let users = parse(&output.text_content());
    assert_eq!(users["alice"]["id"], 1);
    assert!(users["ghost"].is_null());
}

#[tokio::test]
async fn test_work_items_list_uses_graphql() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "namespace": {
                    "workItems": {
                        "nodes": [
                            {"id": "gid://gitlab/WorkItem/77", "iid": "3", "title": "Epic work"}
                        ],
                        "pageInfo": {"hasNextPage": false, "endCursor": null}
                    }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = common::context(common::client_for(&server));
    let output = manager()
        .dispatch(
            "browse_work_items",
            &ctx,
            json!({"action": "list", "namespace": "group/app"}),
        )
        .await
        .unwrap();

    assert!(output.text_content().contains("Epic work"));
}

#[tokio::test]
async fn test_graphql_errors_surface() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Field 'bogus' doesn't exist"}]
        })))
        .mount(&server)
        .await;

    let client = common::client_for(&server);
    let err = client.graphql("{ bogus }", json!({})).await.unwrap_err();
    assert!(matches!(err, GitLabError::GraphQL(ref m) if m.contains("bogus")));
}

#[tokio::test]
async fn test_manage_release_create_link_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/42/releases/v1.0/assets/links"))
        .and(body_json(json!({
            "name": "binary",
            "url": "https://example.com/bin",
            "link_type": "package"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = common::context(common::client_for(&server));
    let output = manager()
        .dispatch(
            "manage_release",
            &ctx,
            json!({
                "action": "create_link",
                "project_id": "42",
                "tag_name": "v1.0",
                "name": "binary",
                "url": "https://example.com/bin",
                "link_type": "package"
            }),
        )
        .await
        .unwrap();

    assert_eq!(parse(&output.text_content())["id"], 9);
}
