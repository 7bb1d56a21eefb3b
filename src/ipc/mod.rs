//! Supervised JSON-lines bridge to the processing worker.
//!
//! The worker is a long-running child process that reads one request object per
//! line on stdin and writes responses, progress, and log records on stdout.
//!
//! Layers, leaves first:
//! - `framer`: raw stdout bytes into complete lines
//! - `protocol`: wire types and line classification
//! - `correlator`: pending requests keyed by id, with deadlines
//! - `router`: fan-out of non-response messages to subscribers
//! - `supervisor`: child process lifecycle and serialized stdin writes
//! - `bridge`: the facade callers use
//!
//! Protocol:
//! - Requests (bridge → worker): {"type": "...", "id": "...", "data": {...}}
//! - Responses (worker → bridge): {"type": "response", "id": "...", "success": bool, ...}
//! - Unsolicited (worker → bridge): {"type": "progress" | "log", ...}

mod bridge;
mod correlator;
mod error;
mod framer;
mod protocol;
mod router;
mod supervisor;


pub use bridge::{BackendStatus, Bridge, BridgeConfig, RestartPolicy};
pub use correlator::{CallResult, PendingCall, RequestCorrelator, DEFAULT_REQUEST_TIMEOUT};
pub use error::BridgeError;
pub use framer::{FramedLines, LineFramer, MAX_LINE_BYTES};
pub use protocol::{
    classify, InboundMessage, OutboundRequest, ProcessAudioOptions, ProcessAudioRequest,
    ProcessAudioResult, ProgressUpdate, WorkerLog, WorkerResponse, WorkerStatus, GET_STATUS, PING,
    PROCESS_AUDIO, STOP,
};
pub use router::{BridgeEvent, EventHandler, EventRouter, SubscriptionId};
pub use supervisor::{
    pump_stdout, resolve_executable, ProcessSupervisor, WorkerCommand, WorkerExit, WorkerObserver,
    WorkerState, DEFAULT_STOP_GRACE,
};
