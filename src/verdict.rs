//! Verdict Builder
//!
//! Pure mapping from alert + reputation result into the outbound enrichment
//! envelope. No I/O and no failure path; the md5 precondition is enforced by
//! the pipeline before this stage runs.

use serde::Serialize;

use crate::alert::Alert;
use crate::reputation::{LookupFault, ReputationResult};
use crate::INTEGRATION;

/// Outbound enrichment record: `{integration, virustotal: {...}}`.
///
/// Serialized field order is declaration order, so the emitted JSON is
/// byte-identical for identical inputs.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictEnvelope {
    pub integration: &'static str,
    pub virustotal: VerdictBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerdictBody {
    /// 1 when the service knows the hash, else 0.
    pub found: u8,
    /// 1 when found and at least one engine flagged the file, else 0.
    pub malicious: u8,
    pub source: VerdictSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positives: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

/// Identifiers tying the verdict back to the originating alert.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictSource {
    pub alert_id: String,
    pub file: String,
    pub md5: String,
    pub sha1: Option<String>,
}

/// Error-shaped envelope delivered when the lookup itself failed, so
/// downstream consumers still see a record for the alert.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub integration: &'static str,
    pub virustotal: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: u16,
    pub description: &'static str,
}

impl VerdictEnvelope {
    /// Build the enrichment record for `alert` from a completed lookup.
    ///
    /// Caller guarantees `syscheck.md5_after` is present.
    pub fn build(alert: &Alert, reputation: &ReputationResult) -> Self {
        let mut body = VerdictBody {
            found: 0,
            malicious: 0,
            source: VerdictSource {
                alert_id: alert.id.clone(),
                file: alert.syscheck.path.clone(),
                md5: alert.syscheck.md5_after.clone().unwrap_or_default(),
                sha1: alert.syscheck.sha1_after.clone(),
            },
            sha1: None,
            scan_date: None,
            positives: None,
            total: None,
            permalink: None,
        };

        if reputation.found {
            body.found = 1;
            body.malicious = u8::from(reputation.malicious);
            body.sha1 = reputation.sha1.clone();
            body.scan_date = reputation.scan_date.clone();
            body.positives = Some(reputation.positives);
            body.total = Some(reputation.total);
            body.permalink = reputation.permalink.clone();
        }

        Self {
            integration: INTEGRATION,
            virustotal: body,
        }
    }
}

impl ErrorEnvelope {
    /// Build the error record for a status-classified lookup fault.
    ///
    /// Returns `None` for transport-level faults, which carry no HTTP
    /// status and produce no record.
    pub fn from_fault(fault: &LookupFault) -> Option<Self> {
        let (error, description) = fault.status().zip(fault.description())?;
        Some(Self {
            integration: INTEGRATION,
            virustotal: ErrorBody { error, description },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Syscheck;

    fn alert() -> Alert {
        Alert {
            id: "5".to_string(),
            agent: None,
            syscheck: Syscheck {
                path: "/etc/passwd".to_string(),
                md5_after: Some("d41d8cd98f00b204e9800998ecf8427e".to_string()),
                sha1_after: None,
            },
        }
    }

    #[test]
    fn test_not_found_defaults() {
        let verdict = VerdictEnvelope::build(&alert(), &ReputationResult::default());
        assert_eq!(verdict.virustotal.found, 0);
        assert_eq!(verdict.virustotal.malicious, 0);
        assert!(verdict.virustotal.positives.is_none());
        assert_eq!(verdict.virustotal.source.alert_id, "5");
        assert_eq!(verdict.virustotal.source.file, "/etc/passwd");
    }

    #[test]
    fn test_found_with_positives_is_malicious() {
        let reputation = ReputationResult {
            found: true,
            malicious: true,
            sha1: Some("abc".to_string()),
            scan_date: Some("2020-01-01".to_string()),
            positives: 3,
            total: 10,
            permalink: Some("http://x".to_string()),
        };

        let verdict = VerdictEnvelope::build(&alert(), &reputation);
        assert_eq!(verdict.virustotal.found, 1);
        assert_eq!(verdict.virustotal.malicious, 1);
        assert_eq!(verdict.virustotal.positives, Some(3));
        assert_eq!(verdict.virustotal.total, Some(10));
        assert_eq!(verdict.virustotal.sha1.as_deref(), Some("abc"));
        assert_eq!(verdict.virustotal.scan_date.as_deref(), Some("2020-01-01"));
        assert_eq!(verdict.virustotal.permalink.as_deref(), Some("http://x"));
    }

    #[test]
    fn test_found_without_positives_is_clean() {
        let reputation = ReputationResult {
            found: true,
            malicious: false,
            positives: 0,
            total: 70,
            ..Default::default()
        };

        let verdict = VerdictEnvelope::build(&alert(), &reputation);
        assert_eq!(verdict.virustotal.found, 1);
        assert_eq!(verdict.virustotal.malicious, 0);
    }

    #[test]
    fn test_serialized_shape_is_stable() {
        let verdict = VerdictEnvelope::build(&alert(), &ReputationResult::default());
        let a = serde_json::to_string(&verdict).unwrap();
        let b = serde_json::to_string(&verdict).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(r#"{"integration":"virustotal","virustotal":{"found":0,"malicious":0"#));
        // Absent report fields are omitted rather than serialized as null.
        assert!(!a.contains("permalink"));
    }

    #[test]
    fn test_error_envelope_for_rate_limit() {
        let env = ErrorEnvelope::from_fault(&LookupFault::RateLimited).unwrap();
        assert_eq!(env.virustotal.error, 204);
        assert_eq!(
            env.virustotal.description,
            "Error: Public API request rate limit reached"
        );
    }

    #[test]
    fn test_no_error_envelope_for_network_fault() {
        assert!(ErrorEnvelope::from_fault(&LookupFault::Network("refused".into())).is_none());
    }
}
