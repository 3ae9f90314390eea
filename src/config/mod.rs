//! Configuration module
//!
//! Handles loading and validating configuration from TOML files and
//! environment variables, plus the preset/profile definitions that shape the
//! exposed tool catalog.

pub mod loader;
pub mod profiles;
pub mod types;

pub use loader::{load_config, load_config_from_str, load_config_with_env};
pub use profiles::{Profile, ProfileKind, ProfileSet, build_policy};
pub use types::*;
