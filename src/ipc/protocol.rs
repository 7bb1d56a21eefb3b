//! JSON-lines protocol spoken with the processing worker.
//!
//! Outbound requests are `{"type", "id", "data"}` objects. Inbound lines are
//! discriminated by their `type` field; anything that does not decode is kept as
//! `InboundMessage::Malformed` so the reader loop never has to bail.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Requests (bridge → worker)
// ============================================================================

/// Request type names understood by the worker.
pub const PROCESS_AUDIO: &str = "process_audio";
pub const PING: &str = "ping";
pub const GET_STATUS: &str = "get_status";
pub const STOP: &str = "stop";

/// One request line. Serialized once and never touched again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub data: Value,
}

impl OutboundRequest {
    pub fn new(kind: impl Into<String>, id: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            data,
        }
    }

    /// Encode as a single newline-terminated line.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Payload of a `process_audio` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessAudioRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    pub output_dir: String,
    #[serde(default)]
    pub options: ProcessAudioOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessAudioOptions {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enhance_instrumental: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whisper_model: Option<String>,
}

/// Files produced by a successful `process_audio` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessAudioResult {
    pub output_video: String,
    pub vocal_track: String,
    pub instrumental_track: String,
    pub transcription: String,
}

/// Answer to `get_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatus {
    #[serde(default)]
    pub main_module_available: bool,
    #[serde(default)]
    pub current_task_running: bool,
    #[serde(default)]
    pub python_version: Option<String>,
    #[serde(default)]
    pub working_directory: Option<String>,
}

// ============================================================================
// Inbound messages (worker → bridge)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerResponse {
    pub id: String,
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub progress: f64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerLog {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A decoded stdout line.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Response(WorkerResponse),
    Progress(ProgressUpdate),
    Log(WorkerLog),
    /// Valid JSON with a missing or unrecognized `type`.
    Unknown(Value),
    /// Not decodable as a protocol message; `raw` is kept for diagnostics.
    Malformed { raw: String, reason: String },
}

impl InboundMessage {
    pub fn label(&self) -> &'static str {
        match self {
            InboundMessage::Response(_) => "response",
            InboundMessage::Progress(_) => "progress",
            InboundMessage::Log(_) => "log",
            InboundMessage::Unknown(_) => "unknown",
            InboundMessage::Malformed { .. } => "malformed",
        }
    }
}

/// Decode one framed line. Never fails; bad input becomes `Malformed`.
pub fn classify(line: &str) -> InboundMessage {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => return malformed(line, err.to_string()),
    };

    let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("response") => match decode_response(&value) {
            Ok(response) => InboundMessage::Response(response),
            Err(reason) => malformed(line, reason),
        },
        Some("progress") => match serde_json::from_value::<ProgressUpdate>(value) {
            Ok(update) => InboundMessage::Progress(update),
            Err(err) => malformed(line, format!("invalid progress message: {err}")),
        },
        Some("log") => match serde_json::from_value::<WorkerLog>(value) {
            Ok(log) => InboundMessage::Log(log),
            Err(err) => malformed(line, format!("invalid log message: {err}")),
        },
        _ => InboundMessage::Unknown(value),
    }
}

fn malformed(line: &str, reason: String) -> InboundMessage {
    InboundMessage::Malformed {
        raw: line.to_string(),
        reason,
    }
}

fn decode_response(value: &Value) -> Result<WorkerResponse, String> {
    let id = match value.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(format!("response id must be a string, got {other}")),
        None => return Err("response is missing an id".to_string()),
    };
    let success = match value.get("success") {
        Some(Value::Bool(flag)) => *flag,
        Some(other) => return Err(format!("response success must be a bool, got {other}")),
        None => return Err(format!("response {id} is missing success")),
    };
    Ok(WorkerResponse {
        id,
        success,
        data: non_null(value.get("data")),
        error: non_null(value.get("error")),
    })
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.clone()),
    }
}
