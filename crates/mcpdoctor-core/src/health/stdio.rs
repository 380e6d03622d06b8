//! Probes for locally launched servers.

use std::path::{Path, PathBuf};

use super::{Findings, ProbeContext};
use crate::mcp::StdioServer;
use crate::runtime::{
    LauncherCategory, LauncherKind, ProcessOutcome, query_version, run_bounded,
};

/// Container flags that consume the following argument.
const DOCKER_VALUE_FLAGS: &[&str] = &[
    "-e",
    "--env",
    "--env-file",
    "-v",
    "--volume",
    "-p",
    "--publish",
    "--name",
    "--network",
    "--mount",
    "-w",
    "--workdir",
    "--entrypoint",
    "-u",
    "--user",
    "--platform",
];

/// Where a command token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResolution {
    Found(PathBuf),
    /// A file of that name exists but lacks execute permission.
    NotExecutable(PathBuf),
    NotFound,
}

/// Resolve a command against `PATH`, or as a path when it contains a
/// separator. Relative paths are taken relative to `cwd` when given.
pub fn resolve_command(command: &str, cwd: Option<&Path>) -> CommandResolution {
    let as_path = Path::new(command);
    if as_path.components().count() > 1 || as_path.is_absolute() {
        let path = match cwd {
            Some(dir) if as_path.is_relative() => dir.join(as_path),
            _ => as_path.to_path_buf(),
        };
        return if !path.is_file() {
            CommandResolution::NotFound
        } else if is_executable(&path) {
            CommandResolution::Found(path)
        } else {
            CommandResolution::NotExecutable(path)
        };
    }

    if let Ok(path) = which::which(command) {
        return CommandResolution::Found(path);
    }

    let search_path = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
        .map(CommandResolution::NotExecutable)
        .unwrap_or(CommandResolution::NotFound)
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

/// Image reference of a `docker run` invocation.
pub fn docker_image(args: &[String]) -> Option<String> {
    let run_at = args.iter().position(|arg| arg == "run")?;
    let mut rest = args[run_at + 1..].iter();
    while let Some(arg) = rest.next() {
        if DOCKER_VALUE_FLAGS.contains(&arg.as_str()) {
            rest.next();
        } else if !arg.starts_with('-') {
            return Some(arg.clone());
        }
    }
    None
}

pub(crate) async fn check_stdio(server: &StdioServer, ctx: &ProbeContext) -> Findings {
    let mut findings = Findings::default();
    findings.details.resolved_command = Some(
        std::iter::once(server.command.as_str())
            .chain(server.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" "),
    );

    if server.command.is_empty() {
        findings.error("no command configured");
        return findings;
    }

    let cwd = server.cwd.as_deref().map(Path::new);
    match resolve_command(&server.command, cwd) {
        CommandResolution::Found(path) => {
            findings.details.command_path = Some(path.display().to_string());
        }
        CommandResolution::NotExecutable(path) => {
            findings.error(format!(
                "command '{}' found at {} but is not executable",
                server.command,
                path.display()
            ));
            return findings;
        }
        CommandResolution::NotFound => {
            findings.error(format!("command '{}' not found in PATH", server.command));
            return findings;
        }
    }

    if let Some(dir) = cwd
        && !dir.is_dir()
    {
        findings.warn(format!("working directory {} does not exist", dir.display()));
    }

    match server.launcher.category() {
        LauncherCategory::PackageRunner => {
            check_toolchain(server.launcher, ctx, &mut findings).await
        }
        LauncherCategory::ContainerRunner => check_container(server, ctx, &mut findings).await,
        LauncherCategory::DirectRuntime => {
            findings.details.runtime_version =
                query_version(&server.command, ctx.config.process_timeout()).await;
        }
        LauncherCategory::Custom => {}
    }

    findings
}

async fn check_toolchain(launcher: LauncherKind, ctx: &ProbeContext, findings: &mut Findings) {
    let Some(toolchain) = launcher.toolchain() else {
        return;
    };
    let resolved = match &ctx.toolchain_path {
        Some(paths) => which::which_in(toolchain, Some(paths), Path::new(".")),
        None => which::which(toolchain),
    };
    let Ok(path) = resolved else {
        findings.error(format!(
            "{} requires {toolchain}, which was not found in PATH",
            launcher.as_str()
        ));
        return;
    };
    findings.details.runtime_version =
        query_version(&path.to_string_lossy(), ctx.config.process_timeout()).await;
}

async fn check_container(server: &StdioServer, ctx: &ProbeContext, findings: &mut Findings) {
    let timeout = ctx.config.daemon_timeout();
    let info = run_bounded(
        &server.command,
        &["info", "--format", "{{.ServerVersion}}"],
        None,
        timeout,
    )
    .await;
    match info {
        ProcessOutcome::Completed {
            success: true,
            stdout,
            ..
        } => {
            let version = stdout.trim();
            if !version.is_empty() {
                findings.details.runtime_version = Some(version.to_string());
            }
        }
        ProcessOutcome::TimedOut => {
            findings.error(format!(
                "container daemon did not respond within {}s",
                timeout.as_secs()
            ));
            return;
        }
        _ => {
            findings.error("container daemon is not running or unreachable");
            return;
        }
    }

    let Some(image) = docker_image(&server.args) else {
        return;
    };
    findings.details.docker_image = Some(image.clone());
    let inspect = ["image", "inspect", image.as_str()];
    match run_bounded(&server.command, &inspect, None, timeout).await {
        outcome if outcome.succeeded() => {}
        ProcessOutcome::TimedOut => {
            findings.warn(format!(
                "could not verify image {image} within {}s",
                timeout.as_secs()
            ));
        }
        _ => {
            findings.warn(format!(
                "image {image} not present locally; it will be pulled on first start"
            ));
        }
    }
}
