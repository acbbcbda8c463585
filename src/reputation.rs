//! Reputation Client
//!
//! Single-endpoint VirusTotal v2 file-report lookup and HTTP outcome
//! classification. No retries: the service signals its own backoff through
//! 204, so the correct behavior on any fault is to surface it and let the
//! supervisor re-dispatch the alert later.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::EnrichError;

/// VirusTotal v2 file report endpoint.
pub const FILE_REPORT_URL: &str = "https://www.virustotal.com/vtapi/v2/file/report";

/// Bounded request timeout; the supervisor waits synchronously on this
/// process, so the lookup must not stall it.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Faults from a reputation lookup.
///
/// The status-classified variants (`RateLimited`, `Unauthorized`,
/// `RemoteError`) additionally surface a best-effort error envelope on the
/// queue, emitted by the orchestrator; transport and parse faults do not.
#[derive(Debug, Error)]
pub enum LookupFault {
    /// HTTP 204: public API request rate limit reached.
    #[error("rate limit reached")]
    RateLimited,
    /// HTTP 403: bad or under-privileged credentials.
    #[error("credentials rejected")]
    Unauthorized,
    /// Any other non-200 status.
    #[error("API request failed with status {0}")]
    RemoteError(u16),
    /// The request never produced an HTTP status.
    #[error("network error: {0}")]
    Network(String),
    /// A 200 response whose body was not a valid report.
    #[error("parse error: {0}")]
    Parse(String),
}

impl LookupFault {
    /// HTTP status to embed in the error envelope, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited => Some(204),
            Self::Unauthorized => Some(403),
            Self::RemoteError(code) => Some(*code),
            Self::Network(_) | Self::Parse(_) => None,
        }
    }

    /// Human-readable description for the error envelope, for the faults
    /// that produce one.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            Self::RateLimited => Some("Error: Public API request rate limit reached"),
            Self::Unauthorized => Some("Error: Check credentials"),
            Self::RemoteError(_) => Some("Error: API request fail"),
            Self::Network(_) | Self::Parse(_) => None,
        }
    }
}

/// Normalized outcome of a hash lookup.
///
/// `malicious` is true iff `found` is true and `positives > 0`.
#[derive(Debug, Clone, Default)]
pub struct ReputationResult {
    pub found: bool,
    pub malicious: bool,
    pub sha1: Option<String>,
    pub scan_date: Option<String>,
    pub positives: u32,
    pub total: u32,
    pub permalink: Option<String>,
}

/// Raw v2 file report body.
#[derive(Debug, Deserialize)]
struct FileReport {
    response_code: i64,
    #[serde(default)]
    positives: u32,
    #[serde(default)]
    total: u32,
    sha1: Option<String>,
    scan_date: Option<String>,
    permalink: Option<String>,
}

/// VirusTotal file reputation client.
pub struct ReputationClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl ReputationClient {
    /// Build a client for the production endpoint.
    ///
    /// Fails with [`EnrichError::ClientUnavailable`] when the underlying
    /// HTTP facility (TLS backend, resolver) cannot be initialized.
    pub fn new(api_key: &str) -> Result<Self, EnrichError> {
        Self::with_base_url(api_key, FILE_REPORT_URL)
    }

    /// Build a client against an alternate endpoint. Used by tests.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent(concat!("gzip, vt-enrich/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EnrichError::ClientUnavailable(e.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Issue one file-report query for `hash` and classify the outcome.
    pub async fn lookup(&self, hash: &str) -> Result<ReputationResult, LookupFault> {
        debug!(%hash, "querying file reputation");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("resource", hash)])
            .header("Accept-Encoding", "gzip, deflate")
            .send()
            .await
            .map_err(|e| LookupFault::Network(e.to_string()))?;

        match resp.status() {
            StatusCode::OK => {
                let report: FileReport = resp
                    .json()
                    .await
                    .map_err(|e| LookupFault::Parse(e.to_string()))?;
                Ok(normalize(report))
            }
            StatusCode::NO_CONTENT => Err(LookupFault::RateLimited),
            StatusCode::FORBIDDEN => Err(LookupFault::Unauthorized),
            status => Err(LookupFault::RemoteError(status.as_u16())),
        }
    }
}

/// Map a raw report into the normalized result consumed by the verdict
/// builder. A zero `response_code` means the service has never seen the
/// hash.
fn normalize(report: FileReport) -> ReputationResult {
    let found = report.response_code != 0;
    if !found {
        return ReputationResult::default();
    }

    ReputationResult {
        found: true,
        malicious: report.positives > 0,
        sha1: report.sha1,
        scan_date: report.scan_date,
        positives: report.positives,
        total: report.total,
        permalink: report.permalink,
    }
}
