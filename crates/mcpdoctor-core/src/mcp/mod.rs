//! MCP server declarations: classification into typed transports.

pub mod classify;
pub mod server;

pub use classify::{classify, classify_with_env, detect_package};
pub use server::{ClassifiedServer, EnvRefState, RemoteServer, StdioServer, Transport};
