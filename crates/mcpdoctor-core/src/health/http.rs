//! Probes for remote (HTTP/SSE) servers: one bounded initialize handshake.

use serde_json::{Value, json};
use tokio::time::Instant;
use url::Url;

use super::{Findings, McpResponse, ProbeContext, Severity};
use crate::config::DoctorConfig;
use crate::mcp::RemoteServer;

/// Protocol revision announced in the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Stop reading a response body after this many bytes.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the shared client, or `None` if the TLS/HTTP stack is unusable.
pub fn build_client(config: &DoctorConfig) -> Option<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("mcpdoctor/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(config.http_timeout())
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .inspect_err(|e| tracing::warn!(error = %e, "failed to build HTTP client"))
        .ok()
}

/// JSON-RPC `initialize` request body.
pub fn initialize_request() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "mcpdoctor",
                "version": env!("CARGO_PKG_VERSION"),
            },
        },
    })
}

/// Whether `body` holds a JSON-RPC 2.0 response with an `id` and either a
/// `result` or an `error`. Accepts a plain JSON body or an event stream whose
/// `data:` lines carry the message.
pub fn is_valid_handshake(body: &[u8]) -> bool {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return is_jsonrpc_response(&value);
    }
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|data| serde_json::from_str::<Value>(data.trim()).ok())
        .any(|value| is_jsonrpc_response(&value))
}

fn is_jsonrpc_response(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    obj.get("jsonrpc").and_then(Value::as_str) == Some("2.0")
        && obj.contains_key("id")
        && (obj.contains_key("result") || obj.contains_key("error"))
}

/// Interpretation of a handshake HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusVerdict {
    Ok,
    /// 401/403 from a host that always authenticates through OAuth.
    OauthManaged,
    Issue(Severity, String),
}

/// Map a handshake status to a verdict.
pub fn classify_status(
    status: u16,
    valid_body: bool,
    has_headers: bool,
    oauth_managed: bool,
) -> StatusVerdict {
    match status {
        200 if valid_body => StatusVerdict::Ok,
        200 => StatusVerdict::Issue(
            Severity::Warning,
            "HTTP 200 but the response is not a valid MCP JSON-RPC message".to_string(),
        ),
        401 | 403 if has_headers => StatusVerdict::Issue(
            Severity::Warning,
            format!("HTTP {status}: configured credentials may be invalid or expired"),
        ),
        401 | 403 if oauth_managed => StatusVerdict::OauthManaged,
        401 | 403 => StatusVerdict::Issue(
            Severity::Error,
            format!("HTTP {status}: authentication required but no headers are configured"),
        ),
        404 => StatusVerdict::Issue(
            Severity::Error,
            "HTTP 404: endpoint not found".to_string(),
        ),
        405 => StatusVerdict::Issue(
            Severity::Warning,
            "HTTP 405: endpoint does not accept POST".to_string(),
        ),
        500..=599 => StatusVerdict::Issue(Severity::Error, format!("HTTP {status}: server error")),
        _ => StatusVerdict::Issue(Severity::Warning, format!("HTTP {status}: unexpected status")),
    }
}

pub(crate) async fn check_remote(server: &RemoteServer, ctx: &ProbeContext) -> Findings {
    let mut findings = Findings::default();

    let raw = server.probe_url.as_deref().unwrap_or_default().trim();
    if raw.is_empty() {
        findings.error("no URL configured");
        return findings;
    }
    let url = match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(url) => {
            findings.error(format!("unsupported URL scheme '{}'", url.scheme()));
            return findings;
        }
        Err(e) => {
            findings.error(format!("malformed URL: {e}"));
            return findings;
        }
    };

    if ctx.offline {
        findings.warn("HTTP probing disabled; endpoint not checked");
        return findings;
    }
    let Some(client) = ctx.http.as_ref() else {
        findings.warn("HTTP client unavailable; endpoint not checked");
        return findings;
    };

    let timeout = ctx.config.http_timeout();
    let deadline = Instant::now() + timeout;

    let mut request = client
        .post(url.clone())
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .header(reqwest::header::ACCEPT, "application/json, text/event-stream")
        .json(&initialize_request());
    for (name, value) in &server.probe_headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let mut response = match tokio::time::timeout_at(deadline, request.send()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            // without_url keeps query-string secrets out of the message
            findings.error(format!("request failed: {}", e.without_url()));
            return findings;
        }
        Err(_) => {
            findings.error(format!("request timed out after {}s", timeout.as_secs()));
            return findings;
        }
    };

    let status = response.status().as_u16();
    let mut body = Vec::new();
    let _ = tokio::time::timeout_at(deadline, read_body(&mut response, &mut body)).await;
    let valid = is_valid_handshake(&body);

    findings.details.http_status = Some(status);
    findings.details.mcp_response = Some(if valid {
        McpResponse::Valid
    } else {
        McpResponse::Invalid
    });

    let oauth_managed = url
        .host_str()
        .is_some_and(|host| ctx.config.is_oauth_managed_host(host));
    match classify_status(status, valid, server.has_headers(), oauth_managed) {
        StatusVerdict::Ok => {}
        StatusVerdict::OauthManaged => {
            findings.details.auth = Some("oauth_managed".to_string());
        }
        StatusVerdict::Issue(severity, message) => findings.push(severity, message),
    }

    tracing::debug!(status, valid, "handshake finished");
    findings
}

/// Read until a complete handshake message arrives, the body ends, or the
/// size cap is hit.
async fn read_body(response: &mut reqwest::Response, body: &mut Vec<u8>) {
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() >= MAX_BODY_BYTES || is_valid_handshake(body) {
            break;
        }
    }
}
