//! Host environment snapshot and external CLI inventory capture.
//!
//! Both are best-effort: failures become explanatory strings, never issues.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::config::DoctorConfig;
use crate::runtime::{ProcessOutcome, query_version, run_bounded};

/// Shell, search path and runtime versions of the invoking environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentSnapshot {
    pub shell: Option<String>,
    pub path_entries: Vec<String>,
    /// Runtime name to version string, `not found`, or `installed (version unknown)`.
    pub runtimes: BTreeMap<String, String>,
}

/// Collect the snapshot, querying every configured runtime concurrently.
pub async fn snapshot_environment(config: &DoctorConfig) -> EnvironmentSnapshot {
    let shell = std::env::var("SHELL")
        .or_else(|_| std::env::var("COMSPEC"))
        .ok();
    let path_entries = std::env::var_os("PATH")
        .map(|path| {
            std::env::split_paths(&path)
                .map(|entry| entry.display().to_string())
                .collect()
        })
        .unwrap_or_default();

    let timeout = config.process_timeout();
    let mut tasks = JoinSet::new();
    for runtime in &config.runtimes {
        let runtime = runtime.clone();
        tasks.spawn(async move {
            let described = if which::which(&runtime).is_err() {
                "not found".to_string()
            } else {
                query_version(&runtime, timeout)
                    .await
                    .unwrap_or_else(|| "installed (version unknown)".to_string())
            };
            (runtime, described)
        });
    }

    let mut runtimes = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((runtime, described)) => {
                runtimes.insert(runtime, described);
            }
            Err(e) => tracing::warn!(error = %e, "runtime version task failed"),
        }
    }

    EnvironmentSnapshot {
        shell,
        path_entries,
        runtimes,
    }
}

/// Run the configured CLI inventory command and return its output, or a
/// sentence explaining why there is none.
pub async fn capture_cli_inventory(config: &DoctorConfig, project_root: &Path) -> String {
    let Some((program, args)) = config.cli_inventory.split_first() else {
        return "CLI inventory disabled".to_string();
    };
    let shown = config.cli_inventory.join(" ");
    if which::which(program).is_err() {
        return format!("{program} CLI not found in PATH");
    }

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let timeout = config.cli_timeout();
    match run_bounded(program, &args, Some(project_root), timeout).await {
        ProcessOutcome::Completed {
            success: true,
            stdout,
            ..
        } => {
            let out = stdout.trim();
            if out.is_empty() {
                "(no output)".to_string()
            } else {
                out.to_string()
            }
        }
        ProcessOutcome::Completed { stderr, .. } => {
            format!("`{shown}` exited with an error: {}", stderr.trim())
        }
        ProcessOutcome::TimedOut => format!("`{shown}` timed out after {}s", timeout.as_secs()),
        ProcessOutcome::SpawnFailed(e) => format!("failed to run `{shown}`: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_runtime_reported() {
        let config = DoctorConfig {
            runtimes: vec!["no-such-runtime-9931".to_string()],
            ..DoctorConfig::default()
        };
        let snapshot = snapshot_environment(&config).await;
        assert_eq!(snapshot.runtimes["no-such-runtime-9931"], "not found");
    }

    #[tokio::test]
    async fn test_cli_inventory_missing_binary() {
        let config = DoctorConfig {
            cli_inventory: vec!["no-such-cli-1187".to_string(), "mcp".to_string()],
            ..DoctorConfig::default()
        };
        let out = capture_cli_inventory(&config, Path::new(".")).await;
        assert_eq!(out, "no-such-cli-1187 CLI not found in PATH");
    }

    #[tokio::test]
    async fn test_cli_inventory_disabled() {
        let config = DoctorConfig {
            cli_inventory: Vec::new(),
            ..DoctorConfig::default()
        };
        assert_eq!(
            capture_cli_inventory(&config, Path::new(".")).await,
            "CLI inventory disabled"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cli_inventory_captures_output() {
        let config = DoctorConfig {
            cli_inventory: vec!["echo".to_string(), "alpha: ok".to_string()],
            ..DoctorConfig::default()
        };
        assert_eq!(
            capture_cli_inventory(&config, Path::new(".")).await,
            "alpha: ok"
        );
    }
}
