//! Shared core types used across the locator, reader and merge layers.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration tiers in fixed precedence order.
///
/// Declaration order is the precedence order: a server declared in an
/// earlier tier shadows a same-named server in any later tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Organization-managed MCP file.
    ManagedMcp,
    /// Organization-managed settings file.
    ManagedSettings,
    /// Personal MCP declarations (`~/.claude.json`).
    User,
    /// Project-shared MCP declarations (`.mcp.json`).
    Project,
    /// Personal settings (`~/.claude/settings.json`).
    UserSettings,
    /// Project-shared settings (`.claude/settings.json`).
    ProjectSettings,
    /// Project-local personal settings (`.claude/settings.local.json`).
    LocalSettings,
}

impl Tier {
    /// All tiers, highest precedence first.
    pub const ALL: [Tier; 7] = [
        Tier::ManagedMcp,
        Tier::ManagedSettings,
        Tier::User,
        Tier::Project,
        Tier::UserSettings,
        Tier::ProjectSettings,
        Tier::LocalSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::ManagedMcp => "managed-mcp",
            Tier::ManagedSettings => "managed-settings",
            Tier::User => "user",
            Tier::Project => "project",
            Tier::UserSettings => "user-settings",
            Tier::ProjectSettings => "project-settings",
            Tier::LocalSettings => "local-settings",
        }
    }

    /// Position in the precedence order (0 wins).
    pub fn precedence(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a configuration source applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceScope {
    /// Organization-wide, deployed by an administrator.
    Organization,
    /// Applies to every project of the current user.
    AllProjects,
    /// Applies to the detected project only.
    Project,
}

/// What a configuration file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Only an `mcpServers` map is meaningful.
    Mcp,
    /// A settings document: permissions, env, hooks, server policy and model.
    Settings,
}

/// Detected operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
    Unknown,
}

impl Platform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" | "darwin" => Platform::Darwin,
            "windows" => Platform::Windows,
            _ => Platform::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Windows => "windows",
            Platform::Unknown => "unknown",
        }
    }
}

/// One configuration location. Computed once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    pub tier: Tier,
    pub scope: SourceScope,
    /// Meant to be checked into version control or centrally distributed.
    pub shared: bool,
    pub path: PathBuf,
    pub kind: SourceKind,
}
