//! GitLab API module
//!
//! HTTP helper, namespace resolution and tier detection.

pub mod client;
pub mod namespace;
pub mod tier;
pub mod types;

pub use client::GitLabClient;
pub use namespace::{NamespaceScope, ResolvedNamespace, resolve_namespace, verify_namespace};
pub use tier::detect_tier;
pub use types::*;
