//! Settings sub-schema extracted from settings-kind sources.
//!
//! Extraction is field by field: a missing or mistyped field falls back to
//! its neutral value instead of invalidating the whole document, and unknown
//! fields are ignored.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Allow/deny permission rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

impl Permissions {
    /// Read `{allow, deny}` rule lists, skipping entries that are not strings.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = value else {
            return Self::default();
        };
        Self {
            allow: string_items(map.get("allow")),
            deny: string_items(map.get("deny")),
        }
    }

    /// Whether any allow or deny rule mentions MCP (case-insensitive).
    pub fn has_mcp_rule(&self) -> bool {
        self.allow
            .iter()
            .chain(self.deny.iter())
            .any(|rule| rule.to_lowercase().contains("mcp"))
    }
}

/// The subset of a settings document this tool audits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub permissions: Permissions,
    pub env: BTreeMap<String, String>,
    pub hooks: Map<String, Value>,
    pub allowed_mcp_servers: Vec<Value>,
    pub denied_mcp_servers: Vec<Value>,
    pub enable_all_project_mcp_servers: Option<bool>,
    pub enabled_mcpjson_servers: Vec<String>,
    pub disabled_mcpjson_servers: Vec<String>,
    pub model: Option<String>,
}

impl Settings {
    /// Extract settings from a parsed document root.
    pub fn from_document(root: &Map<String, Value>) -> Self {
        Self {
            permissions: Permissions::from_value(root.get("permissions")),
            env: string_map(root.get("env")),
            hooks: field(root, "hooks"),
            allowed_mcp_servers: field(root, "allowedMcpServers"),
            denied_mcp_servers: field(root, "deniedMcpServers"),
            enable_all_project_mcp_servers: field(root, "enableAllProjectMcpServers"),
            enabled_mcpjson_servers: string_items(root.get("enabledMcpjsonServers")),
            disabled_mcpjson_servers: string_items(root.get("disabledMcpjsonServers")),
            model: field(root, "model"),
        }
    }
}

fn field<T: DeserializeOwned + Default>(root: &Map<String, Value>, key: &str) -> T {
    root.get(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}

/// String entries of an array; other entries and non-arrays are dropped.
fn string_items(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Read a loosely typed `{key: value}` object as strings.
///
/// Non-string scalars are rendered with their JSON text; anything that is not
/// an object yields an empty map.
pub fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}
