//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use mcpdoctor_core::config::DoctorConfig;
use mcpdoctor_core::context::DoctorContext;

/// Isolated home, project and managed directories.
pub struct Fixture {
    _temp: TempDir,
    pub home: PathBuf,
    pub project: PathBuf,
    pub managed: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let home = temp.path().join("home");
        let project = temp.path().join("project");
        let managed = temp.path().join("managed");
        for dir in [&home, &project, &managed] {
            std::fs::create_dir_all(dir).expect("Failed to create fixture dir");
        }
        Self {
            _temp: temp,
            home,
            project,
            managed,
        }
    }

    pub fn write(&self, path: &Path, content: &Value) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, serde_json::to_string_pretty(content).unwrap())
            .expect("Failed to write config");
    }

    pub fn user_config(&self) -> PathBuf {
        self.home.join(".claude.json")
    }

    pub fn project_mcp(&self) -> PathBuf {
        self.project.join(".mcp.json")
    }

    pub fn managed_mcp(&self) -> PathBuf {
        self.managed.join("managed-mcp.json")
    }

    pub fn project_settings(&self) -> PathBuf {
        self.project.join(".claude").join("settings.json")
    }

    pub fn local_settings(&self) -> PathBuf {
        self.project.join(".claude").join("settings.local.json")
    }

    /// Context with no runtime queries and no CLI inventory, so runs are fast
    /// and independent of the host.
    pub fn context(&self, config: DoctorConfig) -> DoctorContext {
        DoctorContext::with_paths(
            self.home.clone(),
            self.project.clone(),
            self.managed.clone(),
            config,
        )
        .cli_inventory(false)
    }
}

pub fn quiet_config() -> DoctorConfig {
    DoctorConfig {
        runtimes: Vec::new(),
        ..DoctorConfig::default()
    }
}

/// A local HTTP endpoint answering every request with one canned response.
pub struct CannedServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl CannedServer {
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_with_headers(status, body, &[]).await
    }

    /// Same as [`CannedServer::start`] with extra response headers.
    pub async fn start_with_headers(status: u16, body: &str, headers: &[(&str, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));
        let extra: String = headers
            .iter()
            .map(|(name, value)| format!("{name}: {value}\r\n"))
            .collect();
        let response = format!(
            "HTTP/1.1 {status} Canned\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             {extra}\r\n\
             {body}",
            body.len()
        );

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let response = response.clone();
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            url: format!("http://127.0.0.1:{port}/mcp"),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Read request headers and a Content-Length body.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }
}

pub const VALID_HANDSHAKE: &str =
    r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"canned","version":"1.0"}}}"#;
