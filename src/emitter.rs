//! Event Emitter
//!
//! Frames a verdict into the analysis queue's line protocol and delivers it
//! as a single datagram over the local Unix socket.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::net::UnixDatagram;
use tracing::debug;

use crate::alert::Agent;
use crate::{INTEGRATION, MANAGER_AGENT_ID};

/// Errors raised while delivering a message to the queue socket.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The envelope could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    /// The socket endpoint does not exist or refused the datagram.
    #[error("queue socket unavailable at {path}: {source}")]
    DeliveryUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One-shot sender for the local analysis queue.
pub struct EventEmitter {
    socket_path: PathBuf,
}

impl EventEmitter {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Serialize `envelope`, frame it for `agent`, and send exactly one
    /// datagram. The socket is scoped to this call and closed on return,
    /// success or not.
    pub async fn emit<T: Serialize>(
        &self,
        envelope: &T,
        agent: Option<&Agent>,
    ) -> Result<(), EmitError> {
        let json = serde_json::to_string(envelope)?;
        let line = frame_message(&json, agent);
        debug!(%line, "sending message to queue");

        let socket = UnixDatagram::unbound().map_err(|e| self.unavailable(e))?;
        socket
            .send_to(line.as_bytes(), &self.socket_path)
            .await
            .map_err(|e| self.unavailable(e))?;
        Ok(())
    }

    fn unavailable(&self, source: std::io::Error) -> EmitError {
        EmitError::DeliveryUnavailable {
            path: self.socket_path.display().to_string(),
            source,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

/// Build the queue line for a serialized envelope.
///
/// Alerts from the manager itself (no agent, or the reserved id `000`) use
/// the unprefixed global destination; anything else is prefixed with the
/// escaped agent location.
pub fn frame_message(json: &str, agent: Option<&Agent>) -> String {
    let routable = agent.and_then(|a| {
        a.id.as_deref()
            .filter(|id| *id != MANAGER_AGENT_ID)
            .map(|id| (id, a))
    });

    match routable {
        Some((id, agent)) => {
            let location = format!(
                "[{}] ({}) {}",
                id,
                agent.name.as_deref().unwrap_or_default(),
                agent.ip.as_deref().unwrap_or("any"),
            );
            format!("1:{}->{}:{}", escape_location(&location), INTEGRATION, json)
        }
        None => format!("1:{}:{}", INTEGRATION, json),
    }
}

/// Escape a location string for embedding in the queue line.
///
/// Pipe must be escaped before colon so the `|` introduced by `|:` is not
/// itself re-escaped.
fn escape_location(location: &str) -> String {
    location.replace('|', "||").replace(':', "|:")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, name: &str, ip: Option<&str>) -> Agent {
        Agent {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            ip: ip.map(str::to_string),
        }
    }

    #[test]
    fn test_frame_without_agent() {
        assert_eq!(
            frame_message("{\"a\":1}", None),
            "1:virustotal:{\"a\":1}"
        );
    }

    #[test]
    fn test_frame_for_manager_agent() {
        let manager = agent("000", "manager", None);
        assert_eq!(
            frame_message("{}", Some(&manager)),
            "1:virustotal:{}"
        );
    }

    #[test]
    fn test_frame_with_agent_location() {
        let a = agent("003", "web01", Some("10.0.0.5"));
        assert_eq!(
            frame_message("{}", Some(&a)),
            "1:[003] (web01) 10.0.0.5->virustotal:{}"
        );
    }

    #[test]
    fn test_frame_missing_ip_is_any() {
        let a = agent("003", "web01", None);
        assert_eq!(
            frame_message("{}", Some(&a)),
            "1:[003] (web01) any->virustotal:{}"
        );
    }

    #[test]
    fn test_location_escaping_order() {
        // Pipe first, then colon: "a:b|c" becomes "a|:b||c", never "a||:b||c".
        assert_eq!(escape_location("a:b|c"), "a|:b||c");

        let a = agent("003", "a:b|c", Some("10.0.0.5"));
        assert_eq!(
            frame_message("{}", Some(&a)),
            "1:[003] (a|:b||c) 10.0.0.5->virustotal:{}"
        );
    }

    #[tokio::test]
    async fn test_emit_delivers_one_datagram() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue");
        let receiver = UnixDatagram::bind(&path).unwrap();

        let emitter = EventEmitter::new(&path);
        emitter
            .emit(&serde_json::json!({"integration": "virustotal"}), None)
            .await
            .unwrap();

        let mut buf = vec![0u8; 4096];
        let n = receiver.recv(&mut buf).await.unwrap();
        let line = String::from_utf8_lossy(&buf[..n]).into_owned();
        assert_eq!(line, "1:virustotal:{\"integration\":\"virustotal\"}");
    }

    #[tokio::test]
    async fn test_emit_missing_socket_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = EventEmitter::new(dir.path().join("nope"));
        let err = emitter
            .emit(&serde_json::json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EmitError::DeliveryUnavailable { .. }));
    }
}
