//! Input schema shaping
//!
//! Turns the `schemars` schema of a tool input type into what MCP clients
//! see: a top-level object schema, with unavailable actions pruned from the
//! `oneOf` branches (discriminated mode) or merged into a single object whose
//! `action` property is an enum (flat mode).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

/// How action-based tools present their input schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaMode {
    /// `oneOf` with one branch per action
    #[default]
    Discriminated,
    /// One object, `action` as an enum, only `action` required
    Flat,
}

impl FromStr for SchemaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discriminated" | "oneof" => Ok(SchemaMode::Discriminated),
            "flat" => Ok(SchemaMode::Flat),
            other => Err(format!(
                "unknown schema mode '{}' (expected discriminated or flat)",
                other
            )),
        }
    }
}

impl fmt::Display for SchemaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaMode::Discriminated => write!(f, "discriminated"),
            SchemaMode::Flat => write!(f, "flat"),
        }
    }
}

/// Action name of one `oneOf` branch
pub fn branch_action(branch: &Value) -> Option<&str> {
    let action = branch.get("properties")?.get("action")?;
    action
        .get("const")
        .and_then(Value::as_str)
        .or_else(|| action.get("enum")?.as_array()?.first()?.as_str())
}

/// Shape a generated schema for exposure.
///
/// `allowed_actions` of `None` keeps every branch; otherwise only branches
/// whose action is listed survive.
pub fn shape_input_schema(
    schema: &Value,
    allowed_actions: Option<&[&str]>,
    mode: SchemaMode,
) -> Map<String, Value> {
    let mut out = match schema {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    out.remove("$schema");
    out.remove("title");

    if let Some(Value::Array(branches)) = out.remove("oneOf") {
        let kept: Vec<Value> = branches
            .into_iter()
            .filter(|branch| match (allowed_actions, branch_action(branch)) {
                (Some(allowed), Some(action)) => allowed.contains(&action),
                _ => true,
            })
            .collect();

        match mode {
            SchemaMode::Discriminated => {
                out.insert("oneOf".to_string(), Value::Array(kept));
            }
            SchemaMode::Flat => merge_branches(&mut out, &kept),
        }
    }

    out.insert("type".to_string(), Value::String("object".to_string()));
    out.entry("properties".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    out
}

fn merge_branches(out: &mut Map<String, Value>, branches: &[Value]) {
    let mut properties = Map::new();
    let mut actions = Vec::new();
    let mut descriptions = Vec::new();

    for branch in branches {
        let Some(action) = branch_action(branch) else {
            continue;
        };
        actions.push(Value::String(action.to_string()));
        if let Some(desc) = branch.get("description").and_then(Value::as_str) {
            descriptions.push(format!("{}: {}", action, desc));
        }

        let Some(Value::Object(props)) = branch.get("properties") else {
            continue;
        };
        for (name, prop) in props {
            if name == "action" {
                continue;
            }
            properties
                .entry(name.clone())
                .or_insert_with(|| prop.clone());
        }
    }

    let mut action_prop = json!({
        "type": "string",
        "enum": actions,
    });
    if !descriptions.is_empty() {
        action_prop["description"] = Value::String(descriptions.join("; "));
    }

    let mut merged = Map::new();
    merged.insert("action".to_string(), action_prop);
    merged.extend(properties);

    out.insert("properties".to_string(), Value::Object(merged));
    out.insert("required".to_string(), json!(["action"]));
}
