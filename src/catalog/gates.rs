//! Environment gates
//!
//! A gate is an environment variable (`USE_MILESTONE`, `USE_FILES`, ...) that
//! switches a group of tools on or off. The value comes from, in order:
//! the environment, the active profile's feature flags, the gate default.

use std::collections::HashMap;
use tracing::warn;

use crate::util::parse_bool;

/// An environment-variable switch controlling tool visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvGate {
    /// Variable name, e.g. `USE_RELEASES`
    pub env_var: &'static str,
    /// Value used when neither the environment nor the profile sets it
    pub default_value: bool,
    /// Feature flag key in profiles, e.g. `releases`
    pub feature: &'static str,
}

impl EnvGate {
    pub const fn new(env_var: &'static str, default_value: bool, feature: &'static str) -> Self {
        Self {
            env_var,
            default_value,
            feature,
        }
    }
}

/// Snapshot of gate-relevant environment values plus profile feature flags
#[derive(Debug, Clone, Default)]
pub struct GateValues {
    env: HashMap<String, String>,
    features: HashMap<String, bool>,
}

impl GateValues {
    /// Capture every `USE_*` variable of the current process
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars().filter(|(key, _)| key.starts_with("USE_")))
    }

    /// Build from explicit key/value pairs (tests, CLI comparisons)
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            features: HashMap::new(),
        }
    }

    /// Attach profile feature flags; they apply when the variable is unset
    pub fn with_features(mut self, features: HashMap<String, bool>) -> Self {
        self.features = features;
        self
    }

    /// Raw environment value of a gate, if set
    pub fn raw(&self, gate: &EnvGate) -> Option<&str> {
        self.env.get(gate.env_var).map(String::as_str)
    }

    /// Resolve whether a gate is open
    pub fn is_enabled(&self, gate: &EnvGate) -> bool {
        if let Some(raw) = self.raw(gate) {
            match parse_bool(raw) {
                Some(value) => return value,
                None => warn!(
                    env_var = gate.env_var,
                    value = raw,
                    "Unrecognized gate value, using default"
                ),
            }
        }

        self.features
            .get(gate.feature)
            .copied()
            .unwrap_or(gate.default_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GATE: EnvGate = EnvGate::new("USE_RELEASES", true, "releases");
    const OFF_BY_DEFAULT: EnvGate = EnvGate::new("USE_EXPERIMENTAL", false, "experimental");

    #[test]
    fn test_unset_uses_default() {
        let values = GateValues::default();
        assert!(values.is_enabled(&GATE));
        assert!(!values.is_enabled(&OFF_BY_DEFAULT));
    }

    #[test]
    fn test_explicit_values() {
        for (raw, expected) in [("false", false), ("0", false), ("off", false), ("TRUE", true), ("1", true)] {
            let values = GateValues::from_pairs([("USE_RELEASES", raw)]);
            assert_eq!(values.is_enabled(&GATE), expected, "value {raw}");
        }
    }

    #[test]
    fn test_invalid_value_falls_back() {
        let values = GateValues::from_pairs([("USE_RELEASES", "maybe")]);
        assert!(values.is_enabled(&GATE));
    }

    #[test]
    fn test_feature_flags_apply_when_env_unset() {
        let features = HashMap::from([("releases".to_string(), false)]);
        let values = GateValues::default().with_features(features.clone());
        assert!(!values.is_enabled(&GATE));

        let values = GateValues::from_pairs([("USE_RELEASES", "true")]).with_features(features);
        assert!(values.is_enabled(&GATE));
    }
}
