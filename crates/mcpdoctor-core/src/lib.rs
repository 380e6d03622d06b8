//! mcpdoctor core library
//!
//! Collects MCP server declarations from the seven layered Claude config
//! sources, merges them by tier precedence, probes each effective server and
//! reports the result as one JSON document.

pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod health;
pub mod mcp;
pub mod redact;
pub mod runtime;
pub mod section;
pub mod status;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        ConflictRecord, DoctorConfig, ParsedConfig, Settings, load_doctor_config, merge_servers,
    };
    pub use crate::types::{ConfigSource, Platform, SourceKind, SourceScope, Tier};

    // Servers
    pub use crate::mcp::{ClassifiedServer, EnvRefState, Transport, classify};
    pub use crate::runtime::LauncherKind;

    // Health
    pub use crate::health::{Health, HealthResult, Issue, ProbeContext, Severity, check_health};

    // Report
    pub use crate::context::DoctorContext;
    pub use crate::error::{DoctorError, DoctorResult};
    pub use crate::section::{ReportView, Section};
    pub use crate::status::{DoctorReport, ReportSummary, collect_report};
}
