//! Fatal error taxonomy.
//!
//! Only these errors stop a run. Missing files, parse failures and probe
//! failures are reported as data inside the report instead.

use std::path::PathBuf;

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DoctorError {
    /// The invocation itself is malformed.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A required precondition of the host environment is missing.
    #[error("preflight failed: {0}")]
    Preflight(String),

    /// The tool's own configuration file could not be used.
    #[error("invalid config file {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// The finished report could not be rendered.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DoctorError {
    /// Stable machine-readable identifier.
    pub fn kind(&self) -> &'static str {
        match self {
            DoctorError::InvalidArguments(_) => "invalid_arguments",
            DoctorError::Preflight(_) => "preflight",
            DoctorError::Config { .. } => "config",
            DoctorError::Serialize(_) => "serialize",
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DoctorError::InvalidArguments(_) => 2,
            _ => 1,
        }
    }

    /// Structured error object printed in place of a report.
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}

pub type DoctorResult<T> = Result<T, DoctorError>;
