//! VirusTotal Alert Enrichment
//!
//! One-shot enrichment adapter for file-integrity alerts: reads a JSON alert
//! from disk, looks up the file's MD5 hash against the VirusTotal file
//! reputation API, and forwards a normalized verdict to the local analysis
//! queue over a Unix datagram socket.
//!
//! The process is invoked once per alert by the host supervisor and reports
//! its outcome through a stable exit-code contract; see [`EnrichError`].
//!
//! # Pipeline
//! ```text
//! arguments ──► alert file ──► reputation lookup ──► verdict ──► queue socket
//! ```

use thiserror::Error;

pub mod alert;
pub mod config;
pub mod diag;
pub mod emitter;
pub mod pipeline;
pub mod reputation;
pub mod verdict;

pub use alert::{Agent, Alert, AlertError, Syscheck};
pub use config::RunConfig;
pub use diag::DiagLog;
pub use emitter::{EmitError, EventEmitter};
pub use reputation::{LookupFault, ReputationClient, ReputationResult};
pub use verdict::{ErrorEnvelope, VerdictEnvelope};

/// Integration name embedded in every outbound envelope and message frame.
pub const INTEGRATION: &str = "virustotal";

/// Agent id reserved for the manager itself; alerts carrying it are routed
/// to the unprefixed global queue destination.
pub const MANAGER_AGENT_ID: &str = "000";

/// Terminal pipeline errors, one per process exit code.
///
/// Every failure is fatal to the run: nothing is retried locally, the
/// supervisor decides whether to re-dispatch the whole alert based on the
/// exit status.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The HTTP client facility could not be initialized.
    #[error("HTTP client unavailable: {0}")]
    ClientUnavailable(String),

    /// Fewer than the two required positional arguments were supplied.
    #[error("wrong arguments")]
    BadArguments,

    /// The alert has no `syscheck.md5_after` field to look up.
    #[error("MD5 checksum not found in alert")]
    BadHashSum,

    /// The reputation service produced no usable response.
    #[error("no usable response from reputation service: {0}")]
    NoResponse(#[source] LookupFault),

    /// The verdict could not be delivered to the queue socket.
    #[error("socket delivery failed: {0}")]
    SocketError(#[source] EmitError),

    /// The alert file does not exist.
    #[error("alert file not found: {0}")]
    FileNotFound(String),

    /// The alert file is not a valid JSON alert document.
    #[error("alert file is not valid JSON: {0}")]
    InvalidJson(String),
}

impl EnrichError {
    /// Process exit status for this error; stable contract consumed by the
    /// invoking supervisor.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ClientUnavailable(_) => 1,
            Self::BadArguments => 2,
            Self::BadHashSum => 3,
            Self::NoResponse(_) => 4,
            Self::SocketError(_) => 5,
            Self::FileNotFound(_) => 6,
            Self::InvalidJson(_) => 7,
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
