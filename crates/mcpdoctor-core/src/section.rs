//! Section selection over a finished report.

use std::fmt;

use serde::Serialize;

use crate::config::merge::ConflictRecord;
use crate::environment::EnvironmentSnapshot;
use crate::health::HealthResult;
use crate::mcp::ClassifiedServer;
use crate::status::{ConfigFileRecord, DoctorReport, ReportMeta, ReportSummary, SettingsAudit};

/// Named subsets of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    All,
    /// Config sources and conflicts.
    Config,
    /// Server inventory across tiers.
    Servers,
    /// Health verdicts with environment and CLI inventory.
    Health,
    Settings,
}

impl Section {
    /// Parse a section name; anything unrecognized selects everything.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "config" | "sources" => Section::Config,
            "servers" | "inventory" => Section::Servers,
            "health" => Section::Health,
            "settings" => Section::Settings,
            _ => Section::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::All => "all",
            Section::Config => "config",
            Section::Servers => "servers",
            Section::Health => "health",
            Section::Settings => "settings",
        }
    }

    fn includes(&self, part: Part) -> bool {
        match self {
            Section::All => true,
            Section::Config => matches!(part, Part::ConfigFiles | Part::Conflicts),
            Section::Servers => {
                matches!(part, Part::AllServers | Part::Effective | Part::Conflicts)
            }
            Section::Health => matches!(part, Part::Effective | Part::CliList | Part::Environment),
            Section::Settings => part == Part::SettingsAudit,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    ConfigFiles,
    AllServers,
    Effective,
    Conflicts,
    SettingsAudit,
    CliList,
    Environment,
}

/// Borrowed projection of a [`DoctorReport`]. `meta` and `summary` are
/// always present.
#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    pub meta: &'a ReportMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_files: Option<&'a [ConfigFileRecord]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_servers_all_tiers: Option<&'a [ClassifiedServer]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_servers: Option<&'a [HealthResult]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<&'a [ConflictRecord]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_audit: Option<&'a [SettingsAudit]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_mcp_list: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<&'a EnvironmentSnapshot>,
    pub summary: &'a ReportSummary,
}

impl DoctorReport {
    /// Select the parts of the report belonging to `section`.
    pub fn project(&self, section: Section) -> ReportView<'_> {
        let pick = |part: Part| section.includes(part);
        ReportView {
            meta: &self.meta,
            config_files: pick(Part::ConfigFiles).then_some(self.config_files.as_slice()),
            all_servers_all_tiers: pick(Part::AllServers)
                .then_some(self.all_servers_all_tiers.as_slice()),
            effective_servers: pick(Part::Effective).then_some(self.effective_servers.as_slice()),
            conflicts: pick(Part::Conflicts).then_some(self.conflicts.as_slice()),
            settings_audit: pick(Part::SettingsAudit).then_some(self.settings_audit.as_slice()),
            cli_mcp_list: pick(Part::CliList).then_some(self.cli_mcp_list.as_str()),
            environment: pick(Part::Environment).then_some(&self.environment),
            summary: &self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!(Section::parse("config"), Section::Config);
        assert_eq!(Section::parse("sources"), Section::Config);
        assert_eq!(Section::parse("INVENTORY"), Section::Servers);
        assert_eq!(Section::parse("health"), Section::Health);
        assert_eq!(Section::parse("settings"), Section::Settings);
        assert_eq!(Section::parse("everything"), Section::All);
    }

    #[test]
    fn test_unknown_name_falls_back_to_all() {
        assert_eq!(Section::parse("bogus"), Section::All);
        assert_eq!(Section::parse(""), Section::All);
    }

    #[test]
    fn test_section_membership() {
        assert!(Section::Config.includes(Part::Conflicts));
        assert!(!Section::Config.includes(Part::Effective));
        assert!(Section::Health.includes(Part::Environment));
        assert!(!Section::Settings.includes(Part::ConfigFiles));
        assert!(Section::All.includes(Part::CliList));
    }
}
