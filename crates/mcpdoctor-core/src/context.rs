//! Run context: resolved paths, platform and tool configuration.

use std::path::{Path, PathBuf};

use crate::config::paths::{config_sources_with_managed_dir, find_project_root, managed_dir};
use crate::config::DoctorConfig;
use crate::error::{DoctorError, DoctorResult};
use crate::types::{ConfigSource, Platform};

/// Everything a run needs to know about its host.
///
/// The CLI builds this once with [`DoctorContext::detect`]; tests use
/// [`DoctorContext::with_paths`] to point every location at a temp tree.
#[derive(Debug, Clone)]
pub struct DoctorContext {
    home_dir: PathBuf,
    invocation_dir: PathBuf,
    project_root: PathBuf,
    managed_dir: PathBuf,
    platform: Platform,
    config: DoctorConfig,
    offline: bool,
    cli_inventory: bool,
}

impl DoctorContext {
    /// Resolve the context from the live environment.
    ///
    /// Fails when no home directory is known, the working directory is
    /// unreadable, or `project_dir` is not an existing directory.
    pub fn detect(project_dir: Option<&Path>, config: DoctorConfig) -> DoctorResult<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            DoctorError::Preflight("could not determine home directory".to_string())
        })?;
        let invocation_dir = std::env::current_dir().map_err(|e| {
            DoctorError::Preflight(format!("could not read current directory: {e}"))
        })?;

        let project_root = match project_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(DoctorError::InvalidArguments(format!(
                        "project directory {} does not exist or is not a directory",
                        dir.display()
                    )));
                }
                dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
            }
            None => find_project_root(&invocation_dir),
        };

        let platform = Platform::current();
        Ok(Self {
            home_dir,
            invocation_dir,
            project_root,
            managed_dir: managed_dir(platform),
            platform,
            config,
            offline: false,
            cli_inventory: true,
        })
    }

    /// Create a context with explicit paths (for testing).
    pub fn with_paths(
        home_dir: PathBuf,
        project_root: PathBuf,
        managed_dir: PathBuf,
        config: DoctorConfig,
    ) -> Self {
        Self {
            home_dir,
            invocation_dir: project_root.clone(),
            project_root,
            managed_dir,
            platform: Platform::current(),
            config,
            offline: false,
            cli_inventory: true,
        }
    }

    /// Skip network probes.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Enable or disable the external CLI inventory capture.
    pub fn cli_inventory(mut self, enabled: bool) -> Self {
        self.cli_inventory = enabled;
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn invocation_dir(&self) -> &Path {
        &self.invocation_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &DoctorConfig {
        &self.config
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn cli_inventory_enabled(&self) -> bool {
        self.cli_inventory
    }

    /// The seven config sources, highest precedence first.
    pub fn sources(&self) -> Vec<ConfigSource> {
        config_sources_with_managed_dir(&self.managed_dir, &self.home_dir, &self.project_root)
    }
}
