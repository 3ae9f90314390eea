//! Tool catalog model
//!
//! Describes tools independently of their handlers and decides which of them
//! are exposed:
//!
//! ```text
//! env gate → tier → read-only → allowed_tools / denied_tools_regex → denied actions
//! ```
//!
//! Gates default to on and can be set per entity with `USE_*` variables or a
//! profile's `[features]` table. An unknown instance tier disables tier
//! filtering. A deny regex that fails to compile is logged and ignored.

pub mod gates;
pub mod metadata;
pub mod patterns;
pub mod policy;
pub mod schema;
pub mod tier;
pub mod types;

pub use gates::{EnvGate, GateValues};
pub use metadata::CatalogMetadata;
pub use patterns::PatternMatcher;
pub use policy::{ActionGuard, CatalogPolicy, split_denied_actions};
pub use schema::{SchemaMode, shape_input_schema};
pub use tier::Tier;
pub use types::{ActionScoped, ActionSpec, Entity, OperationType, ToolShape};
