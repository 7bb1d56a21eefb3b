//! Typed failures surfaced by the bridge.
//!
//! Transport failures (spawn, send, timeout, crash) are produced by the bridge itself;
//! `Worker` carries the error payload the worker reported with `success: false`.

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The worker executable (or a path it requires) does not exist.
    ExecutableNotFound(PathBuf),
    /// The OS refused to spawn the worker.
    SpawnFailed(String),
    /// No worker is running.
    BackendUnavailable,
    /// A worker is already live; stop it before starting another.
    AlreadyRunning { pid: u32 },
    /// The worker's stdin is closed or unwritable.
    SendFailed(String),
    /// No response arrived before the request deadline.
    RequestTimeout { id: String, timeout: Duration },
    /// The worker exited while requests were pending.
    BackendCrashed { code: Option<i32> },
    /// The worker was stopped while requests were pending.
    BackendStopped,
    /// A request with this id is already pending.
    DuplicateRequestId(String),
    /// The outbound request could not be encoded.
    Serialize(String),
    /// The worker answered `success: false`; payload is passed through verbatim.
    Worker(Value),
    /// The worker answered `success: true` but the data did not match the expected shape.
    InvalidResponse(String),
}

impl BridgeError {
    /// True for failures of the bridge/process plumbing rather than the worker's own logic.
    pub fn is_transport(&self) -> bool {
        !matches!(self, BridgeError::Worker(_) | BridgeError::InvalidResponse(_))
    }

    /// Short machine-readable tag used in CLI output and logs.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::ExecutableNotFound(_) => "executable_not_found",
            BridgeError::SpawnFailed(_) => "spawn_failed",
            BridgeError::BackendUnavailable => "backend_unavailable",
            BridgeError::AlreadyRunning { .. } => "already_running",
            BridgeError::SendFailed(_) => "send_failed",
            BridgeError::RequestTimeout { .. } => "request_timeout",
            BridgeError::BackendCrashed { .. } => "backend_crashed",
            BridgeError::BackendStopped => "backend_stopped",
            BridgeError::DuplicateRequestId(_) => "duplicate_request_id",
            BridgeError::Serialize(_) => "serialize",
            BridgeError::Worker(_) => "worker_error",
            BridgeError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::ExecutableNotFound(path) => {
                write!(f, "worker executable not found: {}", path.display())
            }
            BridgeError::SpawnFailed(reason) => write!(f, "failed to spawn worker: {reason}"),
            BridgeError::BackendUnavailable => write!(f, "worker backend not available"),
            BridgeError::AlreadyRunning { pid } => write!(f, "worker already running (pid {pid})"),
            BridgeError::SendFailed(reason) => {
                write!(f, "failed to send message to worker: {reason}")
            }
            BridgeError::RequestTimeout { id, timeout } => write!(
                f,
                "request {id} timed out after {} ms",
                timeout.as_millis()
            ),
            BridgeError::BackendCrashed { code: Some(code) } => {
                write!(f, "worker exited unexpectedly with code {code}")
            }
            BridgeError::BackendCrashed { code: None } => {
                write!(f, "worker exited unexpectedly")
            }
            BridgeError::BackendStopped => write!(f, "worker was stopped"),
            BridgeError::DuplicateRequestId(id) => {
                write!(f, "request id {id} is already pending")
            }
            BridgeError::Serialize(reason) => write!(f, "failed to encode request: {reason}"),
            BridgeError::Worker(Value::String(message)) => f.write_str(message),
            BridgeError::Worker(Value::Null) => write!(f, "worker reported an unspecified error"),
            BridgeError::Worker(other) => write!(f, "worker error: {other}"),
            BridgeError::InvalidResponse(reason) => {
                write!(f, "unexpected worker response: {reason}")
            }
        }
    }
}

impl std::error::Error for BridgeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn worker_string_errors_display_verbatim() {
        let err = BridgeError::Worker(json!("Vocal separation failed: no GPU"));
        assert_eq!(err.to_string(), "Vocal separation failed: no GPU");
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_errors_are_flagged() {
        assert!(BridgeError::BackendUnavailable.is_transport());
        assert!(BridgeError::BackendCrashed { code: Some(1) }.is_transport());
        let timeout = BridgeError::RequestTimeout {
            id: "a".to_string(),
            timeout: Duration::from_millis(50),
        };
        assert!(timeout.is_transport());
        assert_eq!(timeout.to_string(), "request a timed out after 50 ms");
        assert_eq!(timeout.code(), "request_timeout");
    }
}
