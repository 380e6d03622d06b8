//! Typed view of a declared MCP server.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::runtime::LauncherKind;
use crate::types::Tier;

/// Resolution state of a `${NAME}` reference against the process environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnvRefState {
    Set,
    Unset,
}

/// A server declaration classified by transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedServer {
    pub name: String,
    pub tier: Tier,
    pub source: PathBuf,
    #[serde(flatten)]
    pub transport: Transport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum Transport {
    Stdio(StdioServer),
    Http(RemoteServer),
    Sse(RemoteServer),
    Unknown {
        /// Explicit `type` value, when one was given but not recognized.
        #[serde(skip_serializing_if = "Option::is_none")]
        declared_type: Option<String>,
    },
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Stdio(_) => "stdio",
            Transport::Http(_) => "http",
            Transport::Sse(_) => "sse",
            Transport::Unknown { .. } => "unknown",
        }
    }
}

/// Local process server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StdioServer {
    pub command: String,
    pub args: Vec<String>,
    pub launcher: LauncherKind,
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Redacted environment.
    pub env: BTreeMap<String, String>,
    pub env_refs: BTreeMap<String, EnvRefState>,
}

/// Remote HTTP or SSE server.
///
/// `probe_url` and `probe_headers` hold the unredacted values needed for the
/// handshake. They are never serialized and are cleared by
/// [`ClassifiedServer::without_probe_material`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteServer {
    /// Display URL with sensitive query values redacted.
    pub url: Option<String>,
    /// Redacted headers.
    pub headers: BTreeMap<String, String>,
    pub env_refs: BTreeMap<String, EnvRefState>,
    #[serde(skip)]
    pub probe_url: Option<String>,
    #[serde(skip)]
    pub probe_headers: BTreeMap<String, String>,
}

impl RemoteServer {
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }
}

impl ClassifiedServer {
    pub fn remote(&self) -> Option<&RemoteServer> {
        match &self.transport {
            Transport::Http(remote) | Transport::Sse(remote) => Some(remote),
            _ => None,
        }
    }

    pub fn stdio(&self) -> Option<&StdioServer> {
        match &self.transport {
            Transport::Stdio(stdio) => Some(stdio),
            _ => None,
        }
    }

    /// Drop the unredacted URL and headers kept for probing.
    pub fn without_probe_material(mut self) -> Self {
        if let Transport::Http(remote) | Transport::Sse(remote) = &mut self.transport {
            remote.probe_url = None;
            remote.probe_headers.clear();
        }
        self
    }
}
