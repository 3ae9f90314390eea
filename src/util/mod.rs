//! Helpers shared by the GitLab client and the tool definitions.

mod secret;

pub use secret::SecretString;

use std::fmt::Display;

/// Builder for GitLab query strings.
///
/// Values are URL-encoded; unset optional values are left out.
///
/// ```ignore
/// let query = QueryBuilder::new()
///     .param("per_page", 20)
///     .optional("state", Some("active"))
///     .optional("search", None::<&str>)
///     .build();
/// assert_eq!(query, "?per_page=20&state=active");
/// ```
#[derive(Debug, Default)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter that is always sent
    pub fn param(mut self, key: &str, value: impl Display) -> Self {
        self.params.push((
            key.to_string(),
            urlencoding::encode(&value.to_string()).into_owned(),
        ));
        self
    }

    /// Add a parameter only when it has a value
    pub fn optional<T: Display>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Add `key=true` only when the flag is set
    pub fn flag(self, key: &str, value: bool) -> Self {
        if value { self.param(key, true) } else { self }
    }

    /// Add an array parameter (`key[]=a&key[]=b`)
    pub fn list<T: Display>(mut self, key: &str, values: &[T]) -> Self {
        for value in values {
            self.params.push((
                format!("{}[]", key),
                urlencoding::encode(&value.to_string()).into_owned(),
            ));
        }
        self
    }

    /// `""` when empty, `"?k=v&..."` otherwise
    pub fn build(self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .into_iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Parse a boolean environment value (`true/1/yes/on`, `false/0/no/off`)
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `gid://gitlab/WorkItem/42` -> `42`. Plain ids are returned unchanged.
pub fn gid_to_id(gid: &str) -> &str {
    match gid.strip_prefix("gid://gitlab/") {
        Some(rest) => rest.rsplit('/').next().unwrap_or(rest),
        None => gid,
    }
}

/// `("WorkItem", "42")` -> `gid://gitlab/WorkItem/42`. Existing gids pass through.
pub fn to_gid(type_name: &str, id: &str) -> String {
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("gid://gitlab/{}/{}", type_name, id)
    }
}

/// Cut text to at most `max_chars` characters, marking the cut
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}... [truncated]", &text[..idx]),
        None => text.to_string(),
    }
}

/// Recursively replace `"id": "gid://..."` strings with their numeric id
/// and unwrap GraphQL `{"nodes": [...]}` connections. A `nodes` value that
/// is not a list is left as it is.
pub fn simplify_graphql(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(mut map) => {
            if map.len() == 1 && matches!(map.get("nodes"), Some(Value::Array(_))) {
                if let Some(Value::Array(nodes)) = map.remove("nodes") {
                    return Value::Array(nodes.into_iter().map(simplify_graphql).collect());
                }
            }
            let simplified = map
                .into_iter()
                .map(|(key, val)| {
                    let val = match (key.as_str(), val) {
                        ("id", Value::String(s)) if s.starts_with("gid://") => {
                            let id = gid_to_id(&s);
                            id.parse::<u64>()
                                .map(Value::from)
                                .unwrap_or_else(|_| Value::String(id.to_string()))
                        }
                        (_, other) => simplify_graphql(other),
                    };
                    (key, val)
                })
                .collect();
            Value::Object(simplified)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(simplify_graphql).collect()),
        other => other,
    }
}
