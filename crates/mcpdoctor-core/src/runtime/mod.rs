//! Launcher kinds and bounded external process execution.
//!
//! ## Design
//!
//! - `LauncherKind` is derived from the command token of a stdio server
//! - `LauncherCategory` groups launchers by what the health check must verify
//! - `run_bounded` runs a helper process with a deadline and never fails:
//!   spawn errors and timeouts come back as `ProcessOutcome` variants

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// How a stdio server process is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LauncherKind {
    Npx,
    Uvx,
    Bunx,
    Docker,
    Node,
    Python,
    Deno,
    Custom,
}

/// What kind of secondary check a launcher needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherCategory {
    /// Fetches and runs a package; needs its toolchain.
    PackageRunner,
    /// Runs a container image; needs a reachable daemon.
    ContainerRunner,
    /// Runs a script with an interpreter.
    DirectRuntime,
    Custom,
}

impl LauncherKind {
    /// Derive the launcher from a command token, ignoring any directory
    /// prefix and Windows executable suffixes.
    pub fn from_command(command: &str) -> Self {
        let base = Path::new(command)
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let base = [".exe", ".cmd", ".bat"]
            .iter()
            .find_map(|suffix| base.strip_suffix(suffix))
            .unwrap_or(&base);

        match base {
            "npx" | "pnpx" => LauncherKind::Npx,
            "uvx" => LauncherKind::Uvx,
            "bunx" => LauncherKind::Bunx,
            "docker" | "podman" => LauncherKind::Docker,
            "node" => LauncherKind::Node,
            "python" | "python3" => LauncherKind::Python,
            "deno" => LauncherKind::Deno,
            _ => LauncherKind::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LauncherKind::Npx => "npx",
            LauncherKind::Uvx => "uvx",
            LauncherKind::Bunx => "bunx",
            LauncherKind::Docker => "docker",
            LauncherKind::Node => "node",
            LauncherKind::Python => "python",
            LauncherKind::Deno => "deno",
            LauncherKind::Custom => "custom",
        }
    }

    pub fn category(&self) -> LauncherCategory {
        match self {
            LauncherKind::Npx | LauncherKind::Uvx | LauncherKind::Bunx => {
                LauncherCategory::PackageRunner
            }
            LauncherKind::Docker => LauncherCategory::ContainerRunner,
            LauncherKind::Node | LauncherKind::Python | LauncherKind::Deno => {
                LauncherCategory::DirectRuntime
            }
            LauncherKind::Custom => LauncherCategory::Custom,
        }
    }

    /// Toolchain binary a package runner depends on.
    pub fn toolchain(&self) -> Option<&'static str> {
        match self {
            LauncherKind::Npx => Some("node"),
            LauncherKind::Uvx => Some("uv"),
            LauncherKind::Bunx => Some("bun"),
            _ => None,
        }
    }
}

/// Result of a bounded helper-process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed {
        success: bool,
        stdout: String,
        stderr: String,
    },
    TimedOut,
    /// The process could not be started at all.
    SpawnFailed(String),
}

impl ProcessOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, ProcessOutcome::Completed { success: true, .. })
    }
}

/// Run `program args...` with stdin closed, killing it at the deadline.
pub async fn run_bounded(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> ProcessOutcome {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::debug!(program, error = %e, "failed to spawn helper process");
            return ProcessOutcome::SpawnFailed(e.to_string());
        }
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => ProcessOutcome::Completed {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Ok(Err(e)) => ProcessOutcome::SpawnFailed(e.to_string()),
        Err(_) => {
            tracing::warn!(
                program,
                ?args,
                timeout_secs = timeout.as_secs(),
                "helper process timed out"
            );
            ProcessOutcome::TimedOut
        }
    }
}

/// Ask a runtime for its version string (`<program> --version`).
///
/// Returns the first non-empty output line; some interpreters print their
/// version on stderr.
pub async fn query_version(program: &str, timeout: Duration) -> Option<String> {
    match run_bounded(program, &["--version"], None, timeout).await {
        ProcessOutcome::Completed {
            success: true,
            stdout,
            stderr,
        } => stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
