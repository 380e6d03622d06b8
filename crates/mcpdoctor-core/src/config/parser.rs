//! Reading and parsing of a single config source.
//!
//! Nothing here returns an error: a missing file and an unparsable file are
//! both represented in [`ParsedConfig`].

use std::collections::BTreeMap;
use std::io::ErrorKind;

use serde_json::Value;

use super::schema::Settings;
use crate::types::{ConfigSource, SourceKind};

/// Outcome of reading one [`ConfigSource`].
///
/// Holds raw declarations, which may contain secrets; only the derived
/// report records are serialized.
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    pub source: ConfigSource,
    pub exists: bool,
    /// Read or parse failure for an existing file.
    pub parse_error: Option<String>,
    /// Raw `mcpServers` declarations by name.
    pub servers: BTreeMap<String, Value>,
    /// Present for settings-kind sources that parsed successfully.
    pub settings: Option<Settings>,
}

impl ParsedConfig {
    fn empty(source: &ConfigSource, exists: bool, parse_error: Option<String>) -> Self {
        Self {
            source: source.clone(),
            exists,
            parse_error,
            servers: BTreeMap::new(),
            settings: None,
        }
    }

    pub fn has_parse_error(&self) -> bool {
        self.parse_error.is_some()
    }
}

/// Read and parse a source from disk.
pub fn read_source(source: &ConfigSource) -> ParsedConfig {
    let content = match std::fs::read_to_string(&source.path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(
                tier = %source.tier,
                path = %source.path.display(),
                "config source not present"
            );
            return ParsedConfig::empty(source, false, None);
        }
        Err(e) => {
            tracing::warn!(
                tier = %source.tier,
                path = %source.path.display(),
                error = %e,
                "failed to read config source"
            );
            return ParsedConfig::empty(source, true, Some(format!("failed to read: {e}")));
        }
    };
    parse_source_str(source, &content)
}

/// Parse already-loaded content for a source.
pub fn parse_source_str(source: &ConfigSource, content: &str) -> ParsedConfig {
    let root = match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(root)) => root,
        Ok(_) => {
            tracing::warn!(tier = %source.tier, "config source is not a JSON object");
            return ParsedConfig::empty(source, true, Some("expected a JSON object".to_string()));
        }
        Err(e) => {
            tracing::warn!(tier = %source.tier, error = %e, "config source is not valid JSON");
            return ParsedConfig::empty(source, true, Some(e.to_string()));
        }
    };

    let servers = match root.get("mcpServers") {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, decl)| (name.clone(), decl.clone()))
            .collect(),
        _ => BTreeMap::new(),
    };

    let settings = match source.kind {
        SourceKind::Settings => Some(Settings::from_document(&root)),
        SourceKind::Mcp => None,
    };

    tracing::debug!(tier = %source.tier, servers = servers.len(), "parsed config source");

    ParsedConfig {
        source: source.clone(),
        exists: true,
        parse_error: None,
        servers,
        settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceScope, Tier};
    use std::path::PathBuf;

    fn source(kind: SourceKind, path: PathBuf) -> ConfigSource {
        ConfigSource {
            tier: Tier::Project,
            scope: SourceScope::Project,
            shared: true,
            path,
            kind,
        }
    }

    #[test]
    fn test_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let parsed = read_source(&source(SourceKind::Mcp, temp.path().join("absent.json")));
        assert!(!parsed.exists);
        assert!(!parsed.has_parse_error());
        assert!(parsed.servers.is_empty());
    }

    #[test]
    fn test_invalid_json_is_contained() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");
        std::fs::write(&path, "{ not json").unwrap();

        let parsed = read_source(&source(SourceKind::Mcp, path));
        assert!(parsed.exists);
        assert!(parsed.has_parse_error());
        assert!(parsed.servers.is_empty());
        assert!(parsed.settings.is_none());
    }

    #[test]
    fn test_non_object_root_is_parse_error() {
        let parsed = parse_source_str(&source(SourceKind::Mcp, PathBuf::from("x")), "[1, 2]");
        assert!(parsed.exists);
        assert_eq!(parsed.parse_error.as_deref(), Some("expected a JSON object"));
    }

    #[test]
    fn test_servers_extracted() {
        let parsed = parse_source_str(
            &source(SourceKind::Mcp, PathBuf::from("x")),
            r#"{"mcpServers": {"alpha": {"command": "npx"}, "beta": {"url": "https://x"}}}"#,
        );
        assert_eq!(parsed.servers.len(), 2);
        assert!(parsed.settings.is_none());
    }

    #[test]
    fn test_settings_source_without_servers() {
        let parsed = parse_source_str(
            &source(SourceKind::Settings, PathBuf::from("x")),
            r#"{"model": "opus"}"#,
        );
        assert!(parsed.servers.is_empty());
        let settings = parsed.settings.unwrap();
        assert_eq!(settings.model.as_deref(), Some("opus"));
    }

    #[test]
    fn test_non_object_servers_ignored() {
        let parsed = parse_source_str(
            &source(SourceKind::Mcp, PathBuf::from("x")),
            r#"{"mcpServers": ["alpha"]}"#,
        );
        assert!(parsed.servers.is_empty());
        assert!(!parsed.has_parse_error());
    }
}
