//! The tool's own settings: probe timeouts, OAuth host list, runtime list.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{DoctorError, DoctorResult};

/// Tunables read from `config.toml`. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoctorConfig {
    /// Binary checks and runtime version queries.
    pub process_timeout_secs: u64,
    /// Container daemon and image queries.
    pub daemon_timeout_secs: u64,
    /// Handshake POST to remote servers.
    pub http_timeout_secs: u64,
    /// External CLI inventory capture.
    pub cli_timeout_secs: u64,
    /// Host suffixes whose endpoints always authenticate through OAuth.
    pub oauth_managed_hosts: Vec<String>,
    /// Runtimes reported in the environment snapshot.
    pub runtimes: Vec<String>,
    /// Command whose output is captured as the CLI inventory.
    pub cli_inventory: Vec<String>,
}

impl Default for DoctorConfig {
    fn default() -> Self {
        Self {
            process_timeout_secs: 5,
            daemon_timeout_secs: 5,
            http_timeout_secs: 10,
            cli_timeout_secs: 15,
            oauth_managed_hosts: vec!["atlassian.com".to_string()],
            runtimes: ["node", "npm", "npx", "python3", "uv", "uvx", "bun", "deno", "docker"]
                .into_iter()
                .map(String::from)
                .collect(),
            cli_inventory: vec!["claude".to_string(), "mcp".to_string(), "list".to_string()],
        }
    }
}

impl DoctorConfig {
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    pub fn daemon_timeout(&self) -> Duration {
        Duration::from_secs(self.daemon_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn cli_timeout(&self) -> Duration {
        Duration::from_secs(self.cli_timeout_secs)
    }

    /// Whether `host` equals or is a subdomain of a configured OAuth host.
    pub fn is_oauth_managed_host(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.oauth_managed_hosts.iter().any(|pattern| {
            let pattern = pattern.trim_start_matches("*.").to_lowercase();
            host == pattern || host.ends_with(&format!(".{pattern}"))
        })
    }
}

/// Default location: `<config_dir>/mcpdoctor/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mcpdoctor").join("config.toml"))
}

/// Load the tool config.
///
/// An explicit path must exist. The default path is optional; when it does
/// not exist the defaults are used.
pub fn load_doctor_config(explicit: Option<&Path>) -> DoctorResult<DoctorConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(DoctorConfig::default()),
        },
    };

    parse_doctor_config(&path).map_err(|e| DoctorError::Config {
        path: path.clone(),
        message: format!("{e:#}"),
    })
}

fn parse_doctor_config(path: &Path) -> anyhow::Result<DoctorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_doctor_config_str(&content)
}

/// Parse config content from a string.
pub fn parse_doctor_config_str(content: &str) -> anyhow::Result<DoctorConfig> {
    let config: DoctorConfig = toml::from_str(content).context("TOML parsing error")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_doctor_config_str("").unwrap(), DoctorConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = parse_doctor_config_str(
            r#"
http_timeout_secs = 3
oauth_managed_hosts = ["atlassian.com", "*.linear.app"]
"#,
        )
        .unwrap();
        assert_eq!(config.http_timeout(), Duration::from_secs(3));
        assert_eq!(config.process_timeout_secs, 5);
        assert!(config.is_oauth_managed_host("mcp.linear.app"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse_doctor_config_str("retries = 3").is_err());
    }

    #[test]
    fn test_oauth_host_matching() {
        let config = DoctorConfig::default();
        assert!(config.is_oauth_managed_host("mcp.atlassian.com"));
        assert!(config.is_oauth_managed_host("ATLASSIAN.COM"));
        assert!(!config.is_oauth_managed_host("notatlassian.com"));
        assert!(!config.is_oauth_managed_host("example.com"));
    }

    #[test]
    fn test_explicit_missing_path_is_fatal() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = load_doctor_config(Some(&temp.path().join("nope.toml"))).unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}
