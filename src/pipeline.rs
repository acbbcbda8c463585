//! Enrichment Pipeline
//!
//! Orchestrates one run: read alert → check hash precondition → reputation
//! lookup → build verdict → deliver to queue. Components return typed errors
//! and this module owns the mapping onto the exit-code taxonomy; process
//! termination happens in `main` alone.

use tracing::{debug, warn};

use crate::alert::{Alert, AlertError};
use crate::config::RunConfig;
use crate::diag::DiagLog;
use crate::emitter::EventEmitter;
use crate::reputation::ReputationClient;
use crate::verdict::{ErrorEnvelope, VerdictEnvelope};
use crate::{EnrichError, Result};

/// Run the enrichment pipeline once.
///
/// Exactly one message reaches the queue on the success path. For
/// status-classified lookup faults a best-effort error envelope is delivered
/// before the run fails, so downstream consumers never silently lose an
/// alert; delivery failures of that envelope are logged and not escalated.
pub async fn run(config: &RunConfig, diag: &DiagLog) -> Result<()> {
    diag.debug("# Running VirusTotal enrichment");

    let alert = Alert::load(&config.alert_path).map_err(|e| match e {
        AlertError::NotFound(path) => {
            diag.debug(&format!("# Alert file '{path}' doesn't exist"));
            EnrichError::FileNotFound(path)
        }
        AlertError::MalformedInput(msg) => {
            diag.debug(&format!("# Failed getting JSON alert. Error: {msg}"));
            EnrichError::InvalidJson(msg)
        }
    })?;
    diag.debug(&format!(
        "# Opened alert file at '{}'",
        config.alert_path.display()
    ));

    // Fail fast before touching the network.
    let hash = alert.syscheck.md5_after.as_deref().ok_or_else(|| {
        diag.debug("# Exiting: MD5 checksum not found in alert.");
        EnrichError::BadHashSum
    })?;

    let client = ReputationClient::with_base_url(&config.api_key, &config.api_url)?;
    let emitter = EventEmitter::new(&config.socket_path);

    let reputation = match client.lookup(hash).await {
        Ok(reputation) => reputation,
        Err(fault) => {
            diag.debug(&format!("# Reputation lookup failed: {fault}"));
            // Best-effort error record for remote faults; always framed for
            // the global destination, and local delivery failures here are
            // not escalated further.
            if let Some(envelope) = ErrorEnvelope::from_fault(&fault) {
                if let Err(e) = emitter.emit(&envelope, None).await {
                    warn!(error = %e, "failed to deliver lookup error record");
                }
            }
            return Err(EnrichError::NoResponse(fault));
        }
    };
    debug!(found = reputation.found, malicious = reputation.malicious, "lookup complete");

    let verdict = VerdictEnvelope::build(&alert, &reputation);
    diag.debug("# Sending enrichment verdict to queue");

    emitter
        .emit(&verdict, alert.agent.as_ref())
        .await
        .map_err(|e| {
            diag.debug(&format!(
                "# Unable to deliver to socket at '{}'",
                config.socket_path.display()
            ));
            EnrichError::SocketError(e)
        })?;

    diag.debug("# Done");
    Ok(())
}
