//! Classification of raw server declarations into [`ClassifiedServer`].

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use url::Url;

use super::server::{ClassifiedServer, EnvRefState, RemoteServer, StdioServer, Transport};
use crate::config::schema::string_map;
use crate::redact::{is_sensitive_key, redact, redact_map};
use crate::runtime::LauncherKind;
use crate::types::Tier;

/// Arguments that never name the launched package.
const BOILERPLATE_ARGS: &[&str] = &["-y", "--yes", "run", "exec", "--", ""];

/// Classify a declaration, resolving `${...}` references against the
/// current process environment.
pub fn classify(name: &str, decl: &Value, tier: Tier, source: &Path) -> ClassifiedServer {
    classify_with_env(name, decl, tier, source, |var| std::env::var_os(var).is_some())
}

/// Classify with an explicit environment lookup (for testing).
pub fn classify_with_env(
    name: &str,
    decl: &Value,
    tier: Tier,
    source: &Path,
    is_set: impl Fn(&str) -> bool,
) -> ClassifiedServer {
    let empty = Map::new();
    let fields = decl.as_object().unwrap_or(&empty);

    let transport = match detect_transport(fields) {
        TransportTag::Stdio => Transport::Stdio(stdio_server(fields, &is_set)),
        TransportTag::Http => Transport::Http(remote_server(fields, &is_set)),
        TransportTag::Sse => Transport::Sse(remote_server(fields, &is_set)),
        TransportTag::Unknown(declared_type) => Transport::Unknown { declared_type },
    };

    ClassifiedServer {
        name: name.to_string(),
        tier,
        source: source.to_path_buf(),
        transport,
    }
}

enum TransportTag {
    Stdio,
    Http,
    Sse,
    Unknown(Option<String>),
}

fn detect_transport(fields: &Map<String, Value>) -> TransportTag {
    if let Some(declared) = fields.get("type").and_then(Value::as_str) {
        return match declared.to_lowercase().as_str() {
            "stdio" => TransportTag::Stdio,
            "http" | "streamable-http" | "streamablehttp" => TransportTag::Http,
            "sse" => TransportTag::Sse,
            _ => TransportTag::Unknown(Some(declared.to_string())),
        };
    }
    if fields.contains_key("url") {
        TransportTag::Http
    } else if fields.contains_key("command") {
        TransportTag::Stdio
    } else {
        TransportTag::Unknown(None)
    }
}

fn stdio_server(fields: &Map<String, Value>, is_set: &impl Fn(&str) -> bool) -> StdioServer {
    let command = fields
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let args = string_list(fields.get("args"));
    let env = string_map(fields.get("env"));

    let mut env_refs = BTreeMap::new();
    for value in env.values().chain(args.iter()) {
        collect_env_refs(value, is_set, &mut env_refs);
    }

    StdioServer {
        launcher: LauncherKind::from_command(&command),
        package: detect_package(&args),
        cwd: fields.get("cwd").and_then(Value::as_str).map(str::to_string),
        env: redact_map(&env),
        env_refs,
        command,
        args,
    }
}

fn remote_server(fields: &Map<String, Value>, is_set: &impl Fn(&str) -> bool) -> RemoteServer {
    let url = fields.get("url").and_then(Value::as_str).map(str::to_string);
    let headers = string_map(fields.get("headers"));

    let mut env_refs = BTreeMap::new();
    for value in url.iter().chain(headers.values()) {
        collect_env_refs(value, is_set, &mut env_refs);
    }

    RemoteServer {
        url: url.as_deref().map(display_url),
        headers: redact_map(&headers),
        env_refs,
        probe_url: url,
        probe_headers: headers,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// First argument that is neither a flag nor launcher boilerplate.
pub fn detect_package(args: &[String]) -> String {
    args.iter()
        .find(|arg| !arg.starts_with('-') && !BOILERPLATE_ARGS.contains(&arg.as_str()))
        .cloned()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Record every `${NAME}` / `${NAME:-default}` reference found in `value`.
pub fn collect_env_refs(
    value: &str,
    is_set: &impl Fn(&str) -> bool,
    refs: &mut BTreeMap<String, EnvRefState>,
) {
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let inner = &after[..end];
        let var = inner.split(":-").next().unwrap_or_default().trim();
        if !var.is_empty() {
            let state = if is_set(var) {
                EnvRefState::Set
            } else {
                EnvRefState::Unset
            };
            refs.insert(var.to_string(), state);
        }
        rest = &after[end + 1..];
    }
}

/// URL for display: userinfo password and sensitive query values redacted.
fn display_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    if let Some(masked) = url.password().map(redact) {
        let _ = url.set_password(Some(&masked));
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.iter().any(|(key, _)| is_sensitive_key(key)) {
        url.query_pairs_mut().clear().extend_pairs(pairs.iter().map(|(key, value)| {
            let shown = if is_sensitive_key(key) {
                redact(value)
            } else {
                value.clone()
            };
            (key.clone(), shown)
        }));
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn classify_test(decl: Value) -> ClassifiedServer {
        classify_with_env(
            "alpha",
            &decl,
            Tier::Project,
            &PathBuf::from("/work/.mcp.json"),
            |var| var == "PRESENT",
        )
    }

    #[test]
    fn test_explicit_type_wins() {
        let server = classify_test(json!({"type": "sse", "command": "npx", "url": "https://x"}));
        assert_eq!(server.transport.as_str(), "sse");
    }

    #[test]
    fn test_url_implies_http_and_command_implies_stdio() {
        assert_eq!(
            classify_test(json!({"url": "https://x", "command": "npx"}))
                .transport
                .as_str(),
            "http"
        );
        assert_eq!(
            classify_test(json!({"command": "npx"})).transport.as_str(),
            "stdio"
        );
        assert_eq!(classify_test(json!({})).transport.as_str(), "unknown");
        assert_eq!(classify_test(json!("oops")).transport.as_str(), "unknown");
    }

    #[test]
    fn test_unrecognized_explicit_type() {
        let server = classify_test(json!({"type": "websocket", "url": "wss://x"}));
        assert_eq!(
            server.transport,
            Transport::Unknown {
                declared_type: Some("websocket".to_string())
            }
        );
    }

    #[test]
    fn test_stdio_fields() {
        let server = classify_test(json!({
            "command": "npx",
            "args": ["-y", "@modelcontextprotocol/server-github"],
            "cwd": "/tmp",
            "env": {"GITHUB_TOKEN": "ghp_abcdefghijklmnop", "LOG": "info"}
        }));
        let stdio = server.stdio().unwrap();
        assert_eq!(stdio.launcher, LauncherKind::Npx);
        assert_eq!(stdio.package, "@modelcontextprotocol/server-github");
        assert_eq!(stdio.cwd.as_deref(), Some("/tmp"));
        assert_eq!(stdio.env["GITHUB_TOKEN"], "ghp_****mnop");
        assert_eq!(stdio.env["LOG"], "info");
    }

    #[test]
    fn test_detect_package_skips_boilerplate() {
        let args = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(detect_package(&args(&["run", "--rm", "", "mcp/fetch"])), "mcp/fetch");
        assert_eq!(detect_package(&args(&["--yes", "--", "pkg"])), "pkg");
        assert_eq!(detect_package(&args(&["-y"])), "unknown");
        assert_eq!(detect_package(&[]), "unknown");
    }

    #[test]
    fn test_env_refs_resolved() {
        let server = classify_test(json!({
            "command": "node",
            "env": {
                "A": "${PRESENT}",
                "B": "prefix-${MISSING:-fallback}-${PRESENT}",
                "C": "${unterminated"
            }
        }));
        let refs = &server.stdio().unwrap().env_refs;
        assert_eq!(refs.len(), 2);
        assert_eq!(refs["PRESENT"], EnvRefState::Set);
        assert_eq!(refs["MISSING"], EnvRefState::Unset);
    }

    #[test]
    fn test_remote_headers_redacted_but_retained_for_probe() {
        let server = classify_test(json!({
            "type": "http",
            "url": "https://api.example.com/mcp?api_key=supersecretvalue&region=eu",
            "headers": {"Authorization": "Bearer abcdefghijklmnop"}
        }));
        let remote = server.remote().unwrap();
        assert_eq!(remote.headers["Authorization"], "Bear****mnop");
        assert_eq!(
            remote.probe_headers["Authorization"],
            "Bearer abcdefghijklmnop"
        );
        let shown = remote.url.as_deref().unwrap();
        assert!(!shown.contains("supersecretvalue"));
        assert!(shown.contains("region=eu"));
        assert!(remote.probe_url.as_deref().unwrap().contains("supersecretvalue"));

        let json = serde_json::to_value(&server).unwrap();
        assert!(!json.to_string().contains("abcdefghijklmnop"));
        assert_eq!(json["transport"], "http");
    }

    #[test]
    fn test_without_probe_material() {
        let server = classify_test(json!({
            "url": "https://api.example.com/mcp",
            "headers": {"X-Api-Key": "0123456789abcdef"}
        }))
        .without_probe_material();
        let remote = server.remote().unwrap();
        assert!(remote.probe_headers.is_empty());
        assert!(remote.probe_url.is_none());
        assert_eq!(remote.headers["X-Api-Key"], "0123****cdef");
    }

    #[test]
    fn test_serialized_shape() {
        let server = classify_test(json!({"command": "uvx", "args": ["mcp-server-fetch"]}));
        let json = serde_json::to_value(&server).unwrap();
        assert_eq!(json["name"], "alpha");
        assert_eq!(json["tier"], "project");
        assert_eq!(json["transport"], "stdio");
        assert_eq!(json["launcher"], "uvx");
        assert_eq!(json["package"], "mcp-server-fetch");
        assert!(json.get("cwd").is_none());
    }
}
