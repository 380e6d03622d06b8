//! Per-server health probing.
//!
//! A probe starts `healthy`. Warnings raise it to `warning`; an error makes it
//! `error` for good. Every probe failure is recorded as an [`Issue`]; nothing
//! here returns an error to the caller.

pub mod http;
pub mod stdio;

use std::ffi::OsString;

use serde::Serialize;

use crate::config::DoctorConfig;
use crate::mcp::{ClassifiedServer, Transport};

/// Overall health, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl From<Severity> for Health {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => Health::Warning,
            Severity::Error => Health::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

/// Whether a remote endpoint answered the initialize handshake properly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum McpResponse {
    Valid,
    Invalid,
}

/// Facts gathered while probing, shown next to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeDetails {
    /// Command line as it would be launched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_response: Option<McpResponse>,
    /// Set to `oauth_managed` when a 401/403 is expected for the host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

/// A classified server with its probe verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResult {
    #[serde(flatten)]
    pub server: ClassifiedServer,
    pub health: Health,
    pub issues: Vec<Issue>,
    #[serde(flatten)]
    pub details: ProbeDetails,
}

/// Issue list and details collected by one probe.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    health: Option<Health>,
    issues: Vec<Issue>,
    pub details: ProbeDetails,
}

impl Findings {
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let level = Health::from(severity);
        self.health = Some(self.health().max(level));
        self.issues.push(Issue {
            severity,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn health(&self) -> Health {
        self.health.unwrap_or(Health::Healthy)
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Attach the findings to the server, dropping probe-only material.
    pub fn into_result(self, server: ClassifiedServer) -> HealthResult {
        HealthResult {
            health: self.health(),
            issues: self.issues,
            details: self.details,
            server: server.without_probe_material(),
        }
    }
}

/// Shared inputs for every probe in a run.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub config: DoctorConfig,
    /// `None` when no HTTP client could be built.
    pub http: Option<reqwest::Client>,
    /// Skip network probes entirely.
    pub offline: bool,
    /// Search path for package-runner toolchains; `None` uses `PATH`.
    pub toolchain_path: Option<OsString>,
}

impl ProbeContext {
    pub fn new(config: DoctorConfig, offline: bool) -> Self {
        let http = if offline {
            None
        } else {
            http::build_client(&config)
        };
        Self {
            config,
            http,
            offline,
            toolchain_path: None,
        }
    }

    pub fn with_toolchain_path(mut self, path: impl Into<OsString>) -> Self {
        self.toolchain_path = Some(path.into());
        self
    }
}

/// Probe one effective server.
pub async fn check_health(server: ClassifiedServer, ctx: &ProbeContext) -> HealthResult {
    tracing::debug!(name = %server.name, transport = server.transport.as_str(), "probing server");
    let findings = match &server.transport {
        Transport::Stdio(stdio) => stdio::check_stdio(stdio, ctx).await,
        Transport::Http(remote) | Transport::Sse(remote) => http::check_remote(remote, ctx).await,
        Transport::Unknown { declared_type } => {
            let mut findings = Findings::default();
            match declared_type {
                Some(kind) => findings.error(format!("unsupported transport type '{kind}'")),
                None => findings.error("unknown transport: neither 'command' nor 'url' is set"),
            }
            findings
        }
    };
    findings.into_result(server)
}
