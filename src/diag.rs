//! Diagnostic Log
//!
//! Append-only text log consumed by the host's integration tooling. The raw
//! invocation line is written once per run regardless of verbosity; per-step
//! diagnostics are written only when the caller asked for them.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Append-only diagnostic writer for one pipeline run.
#[derive(Debug, Clone)]
pub struct DiagLog {
    path: PathBuf,
    verbose: bool,
}

impl DiagLog {
    pub fn new(path: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            path: path.into(),
            verbose,
        }
    }

    /// Append one line unconditionally. Used for the invocation record.
    pub fn record(&self, line: &str) {
        self.append(line);
    }

    /// Append a timestamped diagnostic line when verbose mode is enabled.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
        if self.verbose {
            let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S");
            self.append(&format!("{now} {msg}"));
        }
    }

    // The log file is best-effort: a missing log directory must not take
    // down the enrichment itself.
    fn append(&self, line: &str) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{line}"));

        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "failed to write diagnostic log");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
