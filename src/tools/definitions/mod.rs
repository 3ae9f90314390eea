//! Tool definitions, one module per entity

pub mod core;
pub mod files;
pub mod integrations;
pub mod milestones;
pub mod refs;
pub mod releases;
pub mod variables;
pub mod webhooks;
pub mod workitems;

use crate::catalog::Entity;
use crate::tools::EntityRegistry;

/// Registry for one entity
pub fn registry_for(entity: Entity) -> EntityRegistry {
    match entity {
        Entity::Core => core::registry(),
        Entity::Milestones => milestones::registry(),
        Entity::WorkItems => workitems::registry(),
        Entity::Releases => releases::registry(),
        Entity::Variables => variables::registry(),
        Entity::Webhooks => webhooks::registry(),
        Entity::Refs => refs::registry(),
        Entity::Integrations => integrations::registry(),
        Entity::Files => files::registry(),
    }
}

/// Every entity registry, in `Entity::all()` order
pub fn all_registries() -> Vec<EntityRegistry> {
    Entity::all().iter().copied().map(registry_for).collect()
}
