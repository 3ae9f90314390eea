//! Catalog properties of the built-in registries

use gitlab_mcp::catalog::{CatalogPolicy, Entity, SchemaMode, schema::branch_action};
use gitlab_mcp::tools::{RegistryManager, definitions};
use std::collections::HashSet;

#[test]
fn test_every_entity_has_a_registry() {
    let registries = definitions::all_registries();
    let entities: Vec<Entity> = registries.iter().map(|r| r.entity()).collect();
    assert_eq!(entities, Entity::all().to_vec());
    assert!(registries.iter().all(|r| !r.is_empty()));
}

#[test]
fn test_registry_size_matches_definitions() {
    for registry in definitions::all_registries() {
        assert_eq!(
            registry.len(),
            registry.tool_definitions().len(),
            "{}",
            registry.entity()
        );
        assert_eq!(registry.len(), registry.tool_names().count());
    }
}

#[test]
fn test_read_only_names_exist_in_registry() {
    for registry in definitions::all_registries() {
        for name in registry.read_only_tool_names() {
            assert!(
                registry.get(name).is_some(),
                "{} lists unknown read-only tool {}",
                registry.entity(),
                name
            );
        }
    }
}

#[test]
fn test_read_only_filter_is_subset_and_stable() {
    for registry in definitions::all_registries() {
        let all: HashSet<&str> = registry.filtered_tools(false).iter().map(|t| t.name).collect();
        let read_only: Vec<&str> = registry.filtered_tools(true).iter().map(|t| t.name).collect();

        assert_eq!(all.len(), registry.len());
        assert!(read_only.iter().all(|name| all.contains(name)));

        let again: Vec<&str> = registry.filtered_tools(true).iter().map(|t| t.name).collect();
        assert_eq!(read_only, again);
    }
}

#[test]
fn test_tool_names_unique_across_entities() {
    let mut seen = HashSet::new();
    for registry in definitions::all_registries() {
        for name in registry.tool_names() {
            assert!(seen.insert(name), "duplicate tool name {}", name);
        }
    }

    let manager = RegistryManager::new(CatalogPolicy::permissive());
    assert_eq!(manager.len(), seen.len());
    assert_eq!(manager.all_tool_definitions_unfiltered().len(), seen.len());
}

#[test]
fn test_manager_views_are_nested() {
    let manager = RegistryManager::new(CatalogPolicy::permissive().with_read_only(true));

    let unfiltered: HashSet<&str> = manager
        .all_tool_definitions_unfiltered()
        .iter()
        .map(|t| t.name)
        .collect();
    let tierless: HashSet<&str> = manager
        .all_tool_definitions_tierless()
        .iter()
        .map(|t| t.name)
        .collect();
    let filtered: HashSet<&str> = manager
        .filtered_tool_definitions()
        .iter()
        .map(|t| t.name)
        .collect();

    assert!(tierless.is_subset(&unfiltered));
    assert!(filtered.is_subset(&tierless));
    assert!(filtered.len() < unfiltered.len());
}

#[test]
fn test_exposed_schemas_match_visible_actions() {
    let policy = CatalogPolicy::permissive()
        .with_read_only(true)
        .with_denied_actions(["browse_files:download"]);
    let manager = RegistryManager::new(policy);

    for exposed in manager.exposed_tools() {
        assert_eq!(exposed.input_schema["type"], "object", "{}", exposed.tool.name);
        if !exposed.tool.shape.is_action_based() {
            continue;
        }

        let branches = exposed.input_schema["oneOf"]
            .as_array()
            .unwrap_or_else(|| panic!("{} has no oneOf", exposed.tool.name));
        let mut in_schema: Vec<&str> = branches.iter().filter_map(branch_action).collect();
        let mut visible: Vec<&str> = exposed.actions.iter().map(|a| a.name).collect();
        in_schema.sort_unstable();
        visible.sort_unstable();
        assert_eq!(in_schema, visible, "{}", exposed.tool.name);
        assert!(exposed.actions.iter().all(|a| !a.mutates()));
    }

    let files = manager
        .exposed_tools()
        .into_iter()
        .find(|e| e.tool.name == "browse_files")
        .unwrap();
    let actions: Vec<&str> = files.actions.iter().map(|a| a.name).collect();
    assert_eq!(actions, vec!["tree", "content"]);
}

#[test]
fn test_flat_schema_mode() {
    let manager = RegistryManager::new(CatalogPolicy::permissive().with_read_only(true))
        .with_schema_mode(SchemaMode::Flat);

    let milestones = manager
        .exposed_tools()
        .into_iter()
        .find(|e| e.tool.name == "browse_milestones")
        .unwrap();
    let schema = &milestones.input_schema;
    assert!(schema.get("oneOf").is_none());
    assert_eq!(schema["required"], serde_json::json!(["action"]));
    let actions = schema["properties"]["action"]["enum"].as_array().unwrap();
    assert_eq!(actions.len(), 5);
}

#[test]
fn test_tool_action_index_covers_catalog() {
    let manager = RegistryManager::new(CatalogPolicy::permissive());
    let index = manager.tool_action_index();

    assert_eq!(index.len(), manager.len());
    assert_eq!(
        index["manage_milestone"],
        vec!["create", "update", "delete", "promote"]
    );
    assert!(index["get_users"].is_empty());
}
