//! Run Configuration
//!
//! Explicit per-invocation configuration; no globals, no hidden state.

use std::path::PathBuf;

use crate::reputation::FILE_REPORT_URL;

/// Default append-only diagnostic log file.
pub const DEFAULT_LOG_PATH: &str = "/var/ossec/logs/integrations.log";

/// Default analysis queue socket the verdict is delivered to.
pub const DEFAULT_SOCKET_PATH: &str = "/var/ossec/queue/sockets/queue";

/// Everything one pipeline run needs, resolved up front from the invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path to the JSON alert document.
    pub alert_path: PathBuf,
    /// VirusTotal API key.
    pub api_key: String,
    /// Reputation endpoint; overridable for tests and proxied deployments.
    pub api_url: String,
    /// Write per-step diagnostics to the log file.
    pub verbose: bool,
    /// Diagnostic log file path.
    pub log_path: PathBuf,
    /// Unix datagram socket the verdict is sent to.
    pub socket_path: PathBuf,
}

impl RunConfig {
    pub fn new(alert_path: impl Into<PathBuf>, api_key: impl Into<String>) -> Self {
        Self {
            alert_path: alert_path.into(),
            api_key: api_key.into(),
            api_url: FILE_REPORT_URL.to_string(),
            verbose: false,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
        }
    }
}
