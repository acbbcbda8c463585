//! Alert Reader
//!
//! Loads and parses the file-integrity alert document produced upstream.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading an alert file.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The alert file does not exist.
    #[error("alert file not found: {0}")]
    NotFound(String),
    /// The file exists but is not a valid JSON alert document.
    #[error("malformed alert document: {0}")]
    MalformedInput(String),
}

/// File-integrity alert as produced by the monitoring agent.
///
/// Read once from disk, immutable afterward.
#[derive(Debug, Clone, Deserialize)]
pub struct Alert {
    /// Alert identifier.
    pub id: String,
    /// Originating endpoint; absent for alerts raised by the manager itself.
    pub agent: Option<Agent>,
    /// File-integrity event payload.
    pub syscheck: Syscheck,
}

/// Monitored endpoint that originated the alert, used only as a routing
/// hint when framing the outbound message.
#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub ip: Option<String>,
}

/// File-integrity change record.
#[derive(Debug, Clone, Deserialize)]
pub struct Syscheck {
    /// Path of the changed file.
    pub path: String,
    /// MD5 of the file after the change; the lookup key. The pipeline
    /// fails fast when it is absent.
    pub md5_after: Option<String>,
    /// SHA1 of the file after the change.
    pub sha1_after: Option<String>,
}

impl Alert {
    /// Read and parse one alert document from `path`.
    ///
    /// No retry: the alert is produced exactly once upstream.
    pub fn load(path: &Path) -> Result<Self, AlertError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AlertError::NotFound(path.display().to_string())
            } else {
                AlertError::MalformedInput(e.to_string())
            }
        })?;

        let alert: Alert =
            serde_json::from_str(&raw).map_err(|e| AlertError::MalformedInput(e.to_string()))?;

        debug!(alert_id = %alert.id, path = %path.display(), "loaded alert");
        Ok(alert)
    }
}
