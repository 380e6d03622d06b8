//! Config source location: project-root detection and the fixed tier list.

use std::path::{Path, PathBuf};

use crate::types::{ConfigSource, Platform, SourceKind, SourceScope, Tier};

/// Directory markers that identify a project root.
const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn", ".jj"];

/// Walk up from `start` to the nearest directory holding a VCS marker.
///
/// Falls back to `start` itself when the filesystem root is reached without
/// finding one.
pub fn find_project_root(start: &Path) -> PathBuf {
    for dir in start.ancestors() {
        if VCS_MARKERS.iter().any(|marker| dir.join(marker).is_dir()) {
            return dir.to_path_buf();
        }
    }
    start.to_path_buf()
}

/// Directory holding administrator-deployed files.
pub fn managed_dir(platform: Platform) -> PathBuf {
    match platform {
        Platform::Darwin => PathBuf::from("/Library/Application Support/ClaudeCode"),
        Platform::Windows => PathBuf::from(r"C:\ProgramData\ClaudeCode"),
        Platform::Linux | Platform::Unknown => PathBuf::from("/etc/claude-code"),
    }
}

/// Build the seven config sources in precedence order.
pub fn config_sources(
    platform: Platform,
    home_dir: &Path,
    project_root: &Path,
) -> Vec<ConfigSource> {
    config_sources_with_managed_dir(&managed_dir(platform), home_dir, project_root)
}

/// Same as [`config_sources`] with an explicit managed directory (for testing).
pub fn config_sources_with_managed_dir(
    managed_dir: &Path,
    home_dir: &Path,
    project_root: &Path,
) -> Vec<ConfigSource> {
    let claude_dir = project_root.join(".claude");
    vec![
        ConfigSource {
            tier: Tier::ManagedMcp,
            scope: SourceScope::Organization,
            shared: true,
            path: managed_dir.join("managed-mcp.json"),
            kind: SourceKind::Mcp,
        },
        ConfigSource {
            tier: Tier::ManagedSettings,
            scope: SourceScope::Organization,
            shared: true,
            path: managed_dir.join("managed-settings.json"),
            kind: SourceKind::Settings,
        },
        ConfigSource {
            tier: Tier::User,
            scope: SourceScope::AllProjects,
            shared: false,
            path: home_dir.join(".claude.json"),
            kind: SourceKind::Mcp,
        },
        ConfigSource {
            tier: Tier::Project,
            scope: SourceScope::Project,
            shared: true,
            path: project_root.join(".mcp.json"),
            kind: SourceKind::Mcp,
        },
        ConfigSource {
            tier: Tier::UserSettings,
            scope: SourceScope::AllProjects,
            shared: false,
            path: home_dir.join(".claude").join("settings.json"),
            kind: SourceKind::Settings,
        },
        ConfigSource {
            tier: Tier::ProjectSettings,
            scope: SourceScope::Project,
            shared: true,
            path: claude_dir.join("settings.json"),
            kind: SourceKind::Settings,
        },
        ConfigSource {
            tier: Tier::LocalSettings,
            scope: SourceScope::Project,
            shared: false,
            path: claude_dir.join("settings.local.json"),
            kind: SourceKind::Settings,
        },
    ]
}
