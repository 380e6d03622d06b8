//! Configuration discovery, reading and merging.
//!
//! Seven sources are consulted, highest precedence first:
//! - managed-mcp / managed-settings: organization files
//! - user: `~/.claude.json`
//! - project: `.mcp.json`
//! - user-settings / project-settings / local-settings

pub mod doctor;
pub mod merge;
pub mod parser;
pub mod paths;
pub mod schema;

pub use doctor::{DoctorConfig, load_doctor_config};
pub use merge::{ConflictRecord, MergeOutcome, Occurrence, merge_servers};
pub use parser::{ParsedConfig, parse_source_str, read_source};
pub use paths::{config_sources, config_sources_with_managed_dir, find_project_root};
pub use schema::{Permissions, Settings};
