//! Report assembly: sources, classification, merge, probes and audits.
//!
//! This module provides the top-level API used by the CLI:
//! - `collect_report` runs every component once and returns a `DoctorReport`
//! - `DoctorReport::project` narrows the report to one section

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task::JoinSet;

use crate::config::merge::{ConflictRecord, merge_servers};
use crate::config::parser::{ParsedConfig, read_source};
use crate::config::schema::Permissions;
use crate::context::DoctorContext;
use crate::environment::{EnvironmentSnapshot, capture_cli_inventory, snapshot_environment};
use crate::health::{Findings, Health, HealthResult, ProbeContext, check_health};
use crate::mcp::{ClassifiedServer, classify};
use crate::redact::redact_map;
use crate::types::{SourceKind, SourceScope, Tier};

// =============================================================================
// Data Structures
// =============================================================================

/// Complete output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub meta: ReportMeta,
    pub config_files: Vec<ConfigFileRecord>,
    /// Every declaration from every tier, shadowed ones included.
    pub all_servers_all_tiers: Vec<ClassifiedServer>,
    /// One probed entry per distinct server name.
    pub effective_servers: Vec<HealthResult>,
    pub conflicts: Vec<ConflictRecord>,
    pub settings_audit: Vec<SettingsAudit>,
    pub cli_mcp_list: String,
    pub environment: EnvironmentSnapshot,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub timestamp: String,
    pub platform: String,
    pub project_root: PathBuf,
    pub invocation_dir: PathBuf,
    pub version: String,
}

/// Parse outcome of one config source.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigFileRecord {
    pub tier: Tier,
    pub scope: SourceScope,
    pub shared: bool,
    pub kind: SourceKind,
    pub path: PathBuf,
    pub exists: bool,
    pub parse_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub server_count: usize,
    pub servers: Vec<String>,
}

impl From<&ParsedConfig> for ConfigFileRecord {
    fn from(parsed: &ParsedConfig) -> Self {
        Self {
            tier: parsed.source.tier,
            scope: parsed.source.scope,
            shared: parsed.source.shared,
            kind: parsed.source.kind,
            path: parsed.source.path.clone(),
            exists: parsed.exists,
            parse_error: parsed.has_parse_error(),
            error: parsed.parse_error.clone(),
            server_count: parsed.servers.len(),
            servers: parsed.servers.keys().cloned().collect(),
        }
    }
}

/// Audit of one settings source.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsAudit {
    pub tier: Tier,
    pub path: PathBuf,
    pub permissions: Permissions,
    /// Redacted environment.
    pub env: BTreeMap<String, String>,
    pub hooks: Map<String, Value>,
    pub allowed_mcp_servers: Vec<Value>,
    pub denied_mcp_servers: Vec<Value>,
    pub enable_all_project_mcp_servers: Option<bool>,
    pub enabled_mcpjson_servers: Vec<String>,
    pub disabled_mcpjson_servers: Vec<String>,
    pub model: Option<String>,
    pub has_mcp_permission_rules: bool,
}

impl SettingsAudit {
    fn from_parsed(parsed: &ParsedConfig) -> Option<Self> {
        let settings = parsed.settings.as_ref()?;
        Some(Self {
            tier: parsed.source.tier,
            path: parsed.source.path.clone(),
            has_mcp_permission_rules: settings.permissions.has_mcp_rule(),
            permissions: settings.permissions.clone(),
            env: redact_map(&settings.env),
            hooks: settings.hooks.clone(),
            allowed_mcp_servers: settings.allowed_mcp_servers.clone(),
            denied_mcp_servers: settings.denied_mcp_servers.clone(),
            enable_all_project_mcp_servers: settings.enable_all_project_mcp_servers,
            enabled_mcpjson_servers: settings.enabled_mcpjson_servers.clone(),
            disabled_mcpjson_servers: settings.disabled_mcpjson_servers.clone(),
            model: settings.model.clone(),
        })
    }
}

/// Counts for a quick overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub configs_found: usize,
    pub configs_checked: usize,
    pub parse_errors: usize,
    pub total_declarations: usize,
    pub total_servers: usize,
    pub healthy: usize,
    pub warnings: usize,
    pub errors: usize,
    pub conflicts: usize,
}

// =============================================================================
// Core Functions
// =============================================================================

/// Run the whole pipeline once.
pub async fn collect_report(ctx: &DoctorContext) -> DoctorReport {
    let parsed: Vec<ParsedConfig> = ctx.sources().iter().map(read_source).collect();

    let all_servers: Vec<ClassifiedServer> = parsed
        .iter()
        .flat_map(|config| {
            config
                .servers
                .iter()
                .map(move |(name, decl)| {
                    classify(name, decl, config.source.tier, &config.source.path)
                })
        })
        .collect();

    let merged = merge_servers(&all_servers);
    tracing::info!(
        declarations = all_servers.len(),
        effective = merged.effective.len(),
        conflicts = merged.conflicts.len(),
        "merged server declarations"
    );

    let probe_ctx = Arc::new(ProbeContext::new(ctx.config().clone(), ctx.is_offline()));
    let (effective_servers, environment, cli_mcp_list) = tokio::join!(
        probe_all(merged.effective, probe_ctx),
        snapshot_environment(ctx.config()),
        cli_inventory(ctx),
    );

    let config_files: Vec<ConfigFileRecord> = parsed.iter().map(ConfigFileRecord::from).collect();
    let settings_audit: Vec<SettingsAudit> =
        parsed.iter().filter_map(SettingsAudit::from_parsed).collect();
    let all_servers_all_tiers: Vec<ClassifiedServer> = all_servers
        .into_iter()
        .map(ClassifiedServer::without_probe_material)
        .collect();

    let summary = summarize(
        &config_files,
        all_servers_all_tiers.len(),
        &effective_servers,
        merged.conflicts.len(),
    );

    DoctorReport {
        meta: ReportMeta {
            timestamp: chrono::Utc::now().to_rfc3339(),
            platform: ctx.platform().as_str().to_string(),
            project_root: ctx.project_root().to_path_buf(),
            invocation_dir: ctx.invocation_dir().to_path_buf(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        config_files,
        all_servers_all_tiers,
        effective_servers,
        conflicts: merged.conflicts,
        settings_audit,
        cli_mcp_list,
        environment,
        summary,
    }
}

/// Probe every effective server concurrently, keeping input order.
async fn probe_all(servers: Vec<ClassifiedServer>, ctx: Arc<ProbeContext>) -> Vec<HealthResult> {
    let mut tasks = JoinSet::new();
    for (index, server) in servers.iter().cloned().enumerate() {
        let ctx = Arc::clone(&ctx);
        tasks.spawn(async move { (index, check_health(server, &ctx).await) });
    }

    let mut slots: Vec<Option<HealthResult>> = vec![None; servers.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => tracing::warn!(error = %e, "health probe task failed"),
        }
    }

    slots
        .into_iter()
        .zip(servers)
        .map(|(slot, server)| {
            slot.unwrap_or_else(|| {
                let mut findings = Findings::default();
                findings.error("health probe aborted unexpectedly");
                findings.into_result(server)
            })
        })
        .collect()
}

async fn cli_inventory(ctx: &DoctorContext) -> String {
    if ctx.cli_inventory_enabled() {
        capture_cli_inventory(ctx.config(), ctx.project_root()).await
    } else {
        "CLI inventory skipped".to_string()
    }
}

fn summarize(
    config_files: &[ConfigFileRecord],
    total_declarations: usize,
    effective: &[HealthResult],
    conflicts: usize,
) -> ReportSummary {
    let count = |level: Health| effective.iter().filter(|r| r.health == level).count();
    ReportSummary {
        configs_found: config_files.iter().filter(|f| f.exists).count(),
        configs_checked: config_files.len(),
        parse_errors: config_files.iter().filter(|f| f.parse_error).count(),
        total_declarations,
        total_servers: effective.len(),
        healthy: count(Health::Healthy),
        warnings: count(Health::Warning),
        errors: count(Health::Error),
        conflicts,
    }
}
