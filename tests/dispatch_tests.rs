//! Dispatch through the registry manager with hand-written tools

mod common;

use async_trait::async_trait;
use gitlab_mcp::catalog::{
    ActionScoped, ActionSpec, CatalogMetadata, CatalogPolicy, Entity, GateValues, OperationType,
    Tier, ToolShape,
};
use gitlab_mcp::error::ToolError;
use gitlab_mcp::tools::{
    EntityRegistry, RegistryManager, ToolContext, ToolExecutor, ToolInfo, ToolOutput,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};

static ECHO_CALLS: AtomicUsize = AtomicUsize::new(0);
static NOTE_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Single-purpose read tool echoing its input
#[derive(Debug, Deserialize, JsonSchema)]
struct Echo {
    message: String,
}

impl ToolInfo for Echo {
    fn name() -> &'static str {
        "echo_milestone"
    }
    fn description() -> &'static str {
        "Echo a message"
    }
    fn entity() -> Entity {
        Entity::Milestones
    }
    fn shape() -> ToolShape {
        ToolShape::Single(OperationType::Read)
    }
}

impl ActionScoped for Echo {
    fn action(&self) -> Option<&'static str> {
        None
    }
    fn operation(&self) -> OperationType {
        OperationType::Read
    }
}

#[async_trait]
impl ToolExecutor for Echo {
    async fn execute(&self, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        ECHO_CALLS.fetch_add(1, Ordering::SeqCst);
        ToolOutput::json_value(json!({ "echo": self.message }))
    }
}

static NOTE_ACTIONS: [ActionSpec; 3] = [
    ActionSpec::new("list", OperationType::Read),
    ActionSpec::new("create", OperationType::Write),
    ActionSpec::new("delete", OperationType::Delete),
];

/// Action-based tool in a second entity
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ManageNote {
    List { release: String },
    Create { release: String, body: String },
    Delete { release: String, id: u64 },
}

impl ToolInfo for ManageNote {
    fn name() -> &'static str {
        "manage_release_note"
    }
    fn description() -> &'static str {
        "Release notes"
    }
    fn entity() -> Entity {
        Entity::Releases
    }
    fn shape() -> ToolShape {
        ToolShape::Actions(&NOTE_ACTIONS)
    }
}

impl ActionScoped for ManageNote {
    fn action(&self) -> Option<&'static str> {
        Some(match self {
            Self::List { .. } => "list",
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
        })
    }
    fn operation(&self) -> OperationType {
        match self {
            Self::List { .. } => OperationType::Read,
            Self::Create { .. } => OperationType::Write,
            Self::Delete { .. } => OperationType::Delete,
        }
    }
}

#[async_trait]
impl ToolExecutor for ManageNote {
    async fn execute(&self, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        NOTE_CALLS.fetch_add(1, Ordering::SeqCst);
        let text = match self {
            Self::List { release } => format!("notes of {}", release),
            Self::Create { release, body } => format!("created '{}' on {}", body, release),
            Self::Delete { release, id } => format!("deleted {} from {}", id, release),
        };
        Ok(ToolOutput::text(text))
    }
}

fn registries() -> Vec<EntityRegistry> {
    let mut milestones = EntityRegistry::new(Entity::Milestones);
    milestones.register::<Echo>();
    let mut releases = EntityRegistry::new(Entity::Releases);
    releases.register::<ManageNote>();
    vec![milestones, releases]
}

fn manager(policy: CatalogPolicy) -> RegistryManager {
    RegistryManager::with_registries(registries(), CatalogMetadata::empty(), policy)
}

fn names(manager: &RegistryManager) -> Vec<&'static str> {
    manager
        .filtered_tool_definitions()
        .iter()
        .map(|t| t.name)
        .collect()
}

#[tokio::test]
async fn test_dispatch_invokes_handler_once() {
    let manager = manager(CatalogPolicy::permissive());
    let ctx = common::context(common::offline_client());
    let before = ECHO_CALLS.load(Ordering::SeqCst);

    let output = manager
        .dispatch("echo_milestone", &ctx, json!({"message": "hi"}))
        .await
        .unwrap();

    assert_eq!(ECHO_CALLS.load(Ordering::SeqCst), before + 1);
    assert!(!output.is_error);
    assert!(output.text_content().contains("\"echo\": \"hi\""));
}

#[tokio::test]
async fn test_unknown_tool_is_not_found() {
    let manager = manager(CatalogPolicy::permissive());
    let ctx = common::context(common::offline_client());
    let echo_before = ECHO_CALLS.load(Ordering::SeqCst);
    let note_before = NOTE_CALLS.load(Ordering::SeqCst);

    let err = manager
        .dispatch("no_such_tool", &ctx, json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::NotFound(ref name) if name == "no_such_tool"));
    assert_eq!(ECHO_CALLS.load(Ordering::SeqCst), echo_before);
    assert_eq!(NOTE_CALLS.load(Ordering::SeqCst), note_before);
}

#[tokio::test]
async fn test_invalid_arguments_rejected_before_execution() {
    let manager = manager(CatalogPolicy::permissive());
    let ctx = common::context(common::offline_client());
    let before = NOTE_CALLS.load(Ordering::SeqCst);

    let err = manager
        .dispatch("manage_release_note", &ctx, json!({"action": "rename"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::InvalidArguments(_)));
    assert_eq!(NOTE_CALLS.load(Ordering::SeqCst), before);
}

#[test]
fn test_gates_switch_entities_independently() {
    let both = manager(CatalogPolicy::permissive());
    assert_eq!(names(&both), vec!["echo_milestone", "manage_release_note"]);

    let no_milestones = manager(
        CatalogPolicy::permissive().with_gates(GateValues::from_pairs([("USE_MILESTONE", "false")])),
    );
    assert_eq!(names(&no_milestones), vec!["manage_release_note"]);

    let no_releases = manager(
        CatalogPolicy::permissive().with_gates(GateValues::from_pairs([("USE_RELEASES", "0")])),
    );
    assert_eq!(names(&no_releases), vec!["echo_milestone"]);

    let neither = manager(CatalogPolicy::permissive().with_gates(GateValues::from_pairs([
        ("USE_MILESTONE", "false"),
        ("USE_RELEASES", "false"),
    ])));
    assert!(names(&neither).is_empty());
}

#[test]
#[serial]
fn test_gates_read_from_process_environment() {
    unsafe {
        std::env::set_var("USE_RELEASES", "false");
        std::env::remove_var("USE_MILESTONE");
    }

    let manager = manager(CatalogPolicy::permissive().with_gates(GateValues::from_process()));
    assert_eq!(names(&manager), vec!["echo_milestone"]);

    unsafe {
        std::env::remove_var("USE_RELEASES");
    }
}

#[tokio::test]
async fn test_gated_tool_is_denied_at_dispatch() {
    let manager = manager(
        CatalogPolicy::permissive().with_gates(GateValues::from_pairs([("USE_MILESTONE", "no")])),
    );
    let ctx = common::context(common::offline_client());
    let before = ECHO_CALLS.load(Ordering::SeqCst);

    let err = manager
        .dispatch("echo_milestone", &ctx, json!({"message": "hi"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::AccessDenied(_)));
    assert!(err.to_string().contains("disabled by USE_MILESTONE"));
    assert_eq!(ECHO_CALLS.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn test_read_only_prunes_and_denies_mutating_actions() {
    let manager = manager(CatalogPolicy::permissive().with_read_only(true));
    let ctx = common::context(common::offline_client());

    let exposed = manager.exposed_tools();
    let notes = exposed
        .iter()
        .find(|e| e.tool.name == "manage_release_note")
        .unwrap();
    let actions: Vec<&str> = notes.actions.iter().map(|a| a.name).collect();
    assert_eq!(actions, vec!["list"]);

    let before = NOTE_CALLS.load(Ordering::SeqCst);
    let err = manager
        .dispatch(
            "manage_release_note",
            &ctx,
            json!({"action": "create", "release": "v1", "body": "hello"}),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("read-only"));
    assert_eq!(NOTE_CALLS.load(Ordering::SeqCst), before);

    let output = manager
        .dispatch(
            "manage_release_note",
            &ctx,
            json!({"action": "list", "release": "v1"}),
        )
        .await
        .unwrap();
    assert_eq!(output.text_content(), "notes of v1");
}

#[tokio::test]
async fn test_denied_action_and_tier() {
    let metadata = CatalogMetadata::empty().with_action_tier(
        "manage_release_note",
        "delete",
        Tier::Ultimate,
    );
    let policy = CatalogPolicy::permissive()
        .with_denied_actions(["manage_release_note:create"])
        .with_tier(Some(Tier::Premium));
    let manager = RegistryManager::with_registries(registries(), metadata, policy);
    let ctx = common::context(common::offline_client());

    let exposed = manager.exposed_tools();
    let notes = exposed
        .iter()
        .find(|e| e.tool.name == "manage_release_note")
        .unwrap();
    let actions: Vec<&str> = notes.actions.iter().map(|a| a.name).collect();
    assert_eq!(actions, vec!["list"]);

    let err = manager
        .dispatch(
            "manage_release_note",
            &ctx,
            json!({"action": "create", "release": "v1", "body": "x"}),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not allowed"));

    let err = manager
        .dispatch(
            "manage_release_note",
            &ctx,
            json!({"action": "delete", "release": "v1", "id": 3}),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("requires GitLab ultimate tier"));
}

#[test]
fn test_allow_list_and_deny_regex() {
    let allowed = manager(CatalogPolicy::permissive().with_allowed_tools(["echo_milestone"]));
    assert_eq!(names(&allowed), vec!["echo_milestone"]);

    let denied =
        manager(CatalogPolicy::permissive().with_denied_patterns(&["^manage_".to_string()]));
    assert_eq!(names(&denied), vec!["echo_milestone"]);

    // An invalid pattern is ignored rather than hiding everything
    let invalid = manager(CatalogPolicy::permissive().with_denied_patterns(&["(".to_string()]));
    assert_eq!(names(&invalid).len(), 2);
}
