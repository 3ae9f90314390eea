//! Presets and profiles
//!
//! A preset is a named filtering bundle shipped with the binary. A profile is
//! the same thing defined by the user in `profiles.toml`, optionally
//! extending a preset. Either can be activated with `GITLAB_PROFILE`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::debug;

use crate::catalog::{CatalogPolicy, Entity, GateValues, PatternMatcher, Tier};
use crate::config::types::ToolsConfig;
use crate::error::ConfigError;

const BUILTIN_PRESETS: &str = include_str!("presets.toml");

/// Filtering bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub description: Option<String>,
    /// Preset this profile starts from
    pub extends: Option<String>,
    pub read_only: Option<bool>,
    pub allowed_tools: Vec<String>,
    pub denied_tools_regex: Option<String>,
    pub denied_actions: Vec<String>,
    /// Entity name -> gate value used when the `USE_*` variable is unset
    pub features: HashMap<String, bool>,
}

impl Profile {
    /// Overlay `self` on top of `base`
    fn merged_over(&self, base: &Profile) -> Profile {
        let mut denied_actions = base.denied_actions.clone();
        for action in &self.denied_actions {
            if !denied_actions.contains(action) {
                denied_actions.push(action.clone());
            }
        }

        let mut features = base.features.clone();
        features.extend(self.features.clone());

        Profile {
            description: self.description.clone().or_else(|| base.description.clone()),
            extends: None,
            read_only: self.read_only.or(base.read_only),
            allowed_tools: if self.allowed_tools.is_empty() {
                base.allowed_tools.clone()
            } else {
                self.allowed_tools.clone()
            },
            denied_tools_regex: self
                .denied_tools_regex
                .clone()
                .or_else(|| base.denied_tools_regex.clone()),
            denied_actions,
            features,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileFile {
    presets: BTreeMap<String, Profile>,
    profiles: BTreeMap<String, Profile>,
}

/// Where a resolved name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Preset,
    Profile,
}

/// All known presets and user profiles
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    presets: BTreeMap<String, Profile>,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileSet {
    /// Only the built-in presets
    pub fn builtin() -> Result<Self, ConfigError> {
        let file: ProfileFile = toml::from_str(BUILTIN_PRESETS).map_err(|e| ConfigError::Invalid {
            message: format!("built-in presets: {}", e),
        })?;
        Ok(Self {
            presets: file.presets,
            profiles: BTreeMap::new(),
        })
    }

    /// Built-in presets plus user profiles parsed from TOML
    pub fn with_user_profiles(mut self, toml_str: &str) -> Result<Self, ConfigError> {
        let file: ProfileFile = toml::from_str(toml_str).map_err(|e| ConfigError::Invalid {
            message: format!("profiles file: {}", e),
        })?;
        self.profiles.extend(file.profiles);
        Ok(self)
    }

    /// Built-in presets plus the user profiles file, if it exists
    pub fn load(profiles_path: Option<&str>) -> Result<Self, ConfigError> {
        let set = Self::builtin()?;
        let Some(path) = resolve_profiles_path(profiles_path) else {
            return Ok(set);
        };
        if !path.exists() {
            if profiles_path.is_some() {
                return Err(ConfigError::Load(format!(
                    "Profiles file not found: {}",
                    path.display()
                )));
            }
            return Ok(set);
        }

        debug!(path = %path.display(), "Loading profiles");
        let content = std::fs::read_to_string(&path)?;
        set.with_user_profiles(&content)
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn preset(&self, name: &str) -> Option<&Profile> {
        self.presets.get(name)
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Resolve a name to an effective profile. User profiles shadow presets
    /// of the same name; `extends` is applied.
    pub fn resolve(&self, name: &str) -> Result<(ProfileKind, Profile), ConfigError> {
        if let Some(profile) = self.profiles.get(name) {
            let resolved = match &profile.extends {
                Some(base_name) => {
                    let base = self
                        .presets
                        .get(base_name)
                        .ok_or_else(|| ConfigError::UnknownProfile(base_name.clone()))?;
                    profile.merged_over(base)
                }
                None => profile.clone(),
            };
            return Ok((ProfileKind::Profile, resolved));
        }

        self.presets
            .get(name)
            .map(|preset| (ProfileKind::Preset, preset.clone()))
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }

    /// Check every preset and profile against the catalog (tool -> actions).
    /// Returns one message per problem.
    pub fn validate(&self, catalog: &BTreeMap<String, Vec<String>>) -> Vec<String> {
        let mut problems = Vec::new();

        let entries = self
            .presets
            .iter()
            .map(|(name, p)| (format!("preset '{}'", name), p))
            .chain(
                self.profiles
                    .iter()
                    .map(|(name, p)| (format!("profile '{}'", name), p)),
            );

        for (label, profile) in entries {
            if let Some(base) = &profile.extends {
                if !self.presets.contains_key(base) {
                    problems.push(format!("{}: extends unknown preset '{}'", label, base));
                }
            }

            for tool in &profile.allowed_tools {
                if !catalog.contains_key(tool) {
                    problems.push(format!("{}: allowed_tools names unknown tool '{}'", label, tool));
                }
            }

            if let Some(pattern) = &profile.denied_tools_regex {
                if let Err(e) = PatternMatcher::new(std::slice::from_ref(pattern)) {
                    problems.push(format!("{}: {}", label, e));
                }
            }

            for entry in &profile.denied_actions {
                match entry.split_once(':') {
                    Some((tool, action)) => match catalog.get(tool) {
                        Some(actions) if actions.iter().any(|a| a == action) => {}
                        Some(_) => problems.push(format!(
                            "{}: tool '{}' has no action '{}'",
                            label, tool, action
                        )),
                        None => problems.push(format!(
                            "{}: denied_actions names unknown tool '{}'",
                            label, tool
                        )),
                    },
                    None => problems.push(format!(
                        "{}: denied action '{}' is not in tool:action form",
                        label, entry
                    )),
                }
            }

            for feature in profile.features.keys() {
                if Entity::try_parse(feature).is_none() {
                    problems.push(format!("{}: unknown feature '{}'", label, feature));
                }
            }
        }

        problems
    }
}

fn resolve_profiles_path(explicit: Option<&str>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(PathBuf::from(shellexpand::tilde(path).as_ref())),
        None => dirs::config_dir().map(|dir| dir.join("gitlab-mcp").join("profiles.toml")),
    }
}

/// Combine the tools configuration with the active profile.
///
/// Explicit configuration wins for scalar settings; deny rules from both
/// sides apply. Profile feature flags feed the gates.
pub fn build_policy(
    tools: &ToolsConfig,
    profile: Option<&Profile>,
    env_gates: GateValues,
    tier: Option<Tier>,
) -> CatalogPolicy {
    let empty = Profile::default();
    let profile = profile.unwrap_or(&empty);

    let allowed_tools = if tools.allowed_tools.is_empty() {
        profile.allowed_tools.clone()
    } else {
        tools.allowed_tools.clone()
    };

    let denied_patterns: Vec<String> = tools
        .denied_tools_regex
        .iter()
        .chain(profile.denied_tools_regex.iter())
        .cloned()
        .collect();

    let denied_actions = tools
        .denied_actions
        .iter()
        .chain(profile.denied_actions.iter());

    CatalogPolicy::permissive()
        .with_read_only(tools.read_only || profile.read_only.unwrap_or(false))
        .with_allowed_tools(allowed_tools)
        .with_denied_patterns(&denied_patterns)
        .with_denied_actions(denied_actions)
        .with_tier(tier)
        .with_gates(env_gates.with_features(profile.features.clone()))
}
