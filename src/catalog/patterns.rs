//! Tool name patterns
//!
//! Regex matching for `denied_tools_regex`. Strict construction is used by
//! profile validation; the lenient form is used at runtime, where an invalid
//! pattern is logged and dropped so it matches nothing.

use crate::error::ConfigError;
use regex::Regex;
use tracing::warn;

/// Compiled pattern matcher
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    patterns: Vec<CompiledPattern>,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl PatternMatcher {
    /// Compile every pattern, failing on the first invalid one
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;

            compiled.push(CompiledPattern {
                source: pattern.clone(),
                regex,
            });
        }

        Ok(Self { patterns: compiled })
    }

    /// Compile what compiles; invalid patterns are skipped with a warning
    pub fn lenient(patterns: &[String]) -> Self {
        let compiled = patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(CompiledPattern {
                    source: pattern.clone(),
                    regex,
                }),
                Err(e) => {
                    warn!(
                        pattern = %pattern,
                        error = %e,
                        "Invalid denied tools regex, ignoring it"
                    );
                    None
                }
            })
            .collect();

        Self { patterns: compiled }
    }

    /// Create an empty pattern matcher (matches nothing)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if a tool name matches any pattern
    pub fn matches(&self, tool_name: &str) -> bool {
        self.find_match(tool_name).is_some()
    }

    /// Check if a tool name matches any pattern, returning the matching pattern
    pub fn find_match(&self, tool_name: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(tool_name))
            .map(|p| p.source.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_matcher() {
        let matcher = PatternMatcher::empty();
        assert!(!matcher.matches("browse_projects"));
        assert!(matcher.is_empty());
    }

    #[test]
    fn test_prefix_match() {
        let matcher = PatternMatcher::new(&["^manage_".to_string()]).unwrap();
        assert!(matcher.matches("manage_release"));
        assert!(matcher.matches("manage_files"));
        assert!(!matcher.matches("browse_releases"));
    }

    #[test]
    fn test_find_match() {
        let matcher =
            PatternMatcher::new(&["^manage_".to_string(), "webhook".to_string()]).unwrap();

        assert_eq!(matcher.find_match("manage_ref"), Some("^manage_"));
        assert_eq!(matcher.find_match("list_webhooks"), Some("webhook"));
        assert_eq!(matcher.find_match("browse_refs"), None);
    }

    #[test]
    fn test_invalid_pattern_strict() {
        let result = PatternMatcher::new(&["[invalid".to_string()]);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_invalid_pattern_lenient_matches_nothing() {
        let matcher = PatternMatcher::lenient(&["[invalid".to_string()]);
        assert!(matcher.is_empty());
        assert!(!matcher.matches("[invalid"));

        let matcher = PatternMatcher::lenient(&["(".to_string(), "^delete".to_string()]);
        assert_eq!(matcher.len(), 1);
        assert!(matcher.matches("delete_thing"));
    }
}
