//! Bridge facade: one worker, correlated calls, and an event stream.

use crate::{log_debug, log_debug_content};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::correlator::{CallResult, PendingCall, RequestCorrelator, DEFAULT_REQUEST_TIMEOUT};
use super::error::BridgeError;
use super::protocol::{
    InboundMessage, OutboundRequest, ProcessAudioRequest, ProcessAudioResult, WorkerLog,
    WorkerResponse, WorkerStatus, GET_STATUS, PING, PROCESS_AUDIO, STOP,
};
use super::router::{BridgeEvent, EventRouter, SubscriptionId};
use super::supervisor::{
    ProcessSupervisor, WorkerCommand, WorkerExit, WorkerObserver, WorkerState, DEFAULT_STOP_GRACE,
};

// ============================================================================
// Configuration
// ============================================================================

/// What happens to calls made after the worker crashed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RestartPolicy {
    /// Calls fail with `BackendUnavailable` until `start()` is called again.
    #[default]
    Manual,
    /// The next call respawns the worker.
    OnDemand,
}

impl RestartPolicy {
    pub fn label(self) -> &'static str {
        match self {
            RestartPolicy::Manual => "manual",
            RestartPolicy::OnDemand => "on-demand",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub command: WorkerCommand,
    pub request_timeout: Duration,
    pub stop_grace: Duration,
    pub restart_policy: RestartPolicy,
}

impl BridgeConfig {
    pub fn new(command: WorkerCommand) -> Self {
        Self {
            command,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stop_grace: DEFAULT_STOP_GRACE,
            restart_policy: RestartPolicy::Manual,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }
}

/// Snapshot answer to "is the worker up?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub connected: bool,
    pub pid: Option<u32>,
}

// ============================================================================
// Dispatch of worker output
// ============================================================================

/// Routes classified worker output: responses to the correlator, everything else
/// to subscribers.
#[derive(Default)]
pub(crate) struct Pipeline {
    pub(crate) correlator: RequestCorrelator,
    pub(crate) router: EventRouter,
    /// Set while a worker `stop` command is in flight so the exit that follows is not a crash.
    shutdown_requested: AtomicBool,
    crashed: AtomicBool,
}

impl Pipeline {
    fn dispatch_response(&self, response: WorkerResponse) {
        let WorkerResponse {
            id,
            success,
            data,
            error,
        } = response;
        let delivered = if success {
            self.correlator.resolve(&id, data.unwrap_or(Value::Null))
        } else {
            self.correlator
                .reject(&id, BridgeError::Worker(error.unwrap_or(Value::Null)))
        };
        if !delivered {
            log_debug(&format!(
                "dropping response for unknown or settled request {id}"
            ));
            tracing::debug!(request_id = %id, "late or unknown response dropped");
        }
    }

    fn crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }
}

fn trace_worker_log(log: &WorkerLog) {
    match log.level.to_ascii_lowercase().as_str() {
        "error" | "critical" => tracing::error!(target: "worker", message = %log.message),
        "warning" | "warn" => tracing::warn!(target: "worker", message = %log.message),
        "debug" => tracing::debug!(target: "worker", message = %log.message),
        _ => tracing::info!(target: "worker", message = %log.message),
    }
}

impl WorkerObserver for Pipeline {
    fn on_started(&self, pid: u32) {
        self.crashed.store(false, Ordering::SeqCst);
        self.shutdown_requested.store(false, Ordering::SeqCst);
        self.router.publish(&BridgeEvent::WorkerStarted { pid });
    }

    fn on_message(&self, message: InboundMessage) {
        match message {
            InboundMessage::Response(response) => self.dispatch_response(response),
            InboundMessage::Progress(update) => {
                self.router.publish(&BridgeEvent::Progress(update));
            }
            InboundMessage::Log(log) => {
                trace_worker_log(&log);
                self.router.publish(&BridgeEvent::Log(log));
            }
            InboundMessage::Unknown(message) => {
                log_debug_content(&format!("unrecognized worker message: {message}"));
                self.router.publish(&BridgeEvent::Unknown { message });
            }
            InboundMessage::Malformed { raw, reason } => {
                log_debug(&format!("skipping malformed worker line: {reason}"));
                log_debug_content(&format!("malformed line: {raw}"));
            }
        }
    }

    fn on_stderr(&self, line: String) {
        self.router.publish(&BridgeEvent::Stderr { line });
    }

    /// Settles every pending call and records whether this was a crash. Runs under
    /// the supervisor's state lock, so a caller that sees the worker gone also sees
    /// its calls cancelled and the crash flag set.
    fn on_lost(&self, exit: WorkerExit) -> bool {
        let requested = self.shutdown_requested.swap(false, Ordering::SeqCst);
        let expected = exit.expected || requested;
        self.crashed.store(!expected, Ordering::SeqCst);
        let reason = if expected {
            BridgeError::BackendStopped
        } else {
            BridgeError::BackendCrashed { code: exit.code }
        };
        self.correlator.cancel_all(&reason);
        expected
    }

    fn on_exit(&self, exit: WorkerExit) {
        self.router.publish(&BridgeEvent::WorkerExited {
            code: exit.code,
            expected: exit.expected,
        });
    }
}

// ============================================================================
// Facade
// ============================================================================

pub struct Bridge {
    config: BridgeConfig,
    pipeline: Arc<Pipeline>,
    supervisor: ProcessSupervisor,
    session_tag: String,
    next_request: AtomicU64,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);
        Self {
            supervisor: ProcessSupervisor::new(config.stop_grace),
            config,
            pipeline: Arc::new(Pipeline::default()),
            session_tag: format!("{millis:x}"),
            next_request: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Spawn the worker, replacing any live one. Returns its pid.
    pub fn start(&self) -> Result<u32, BridgeError> {
        if self.supervisor.stop() {
            log_debug("restarting worker");
        }
        self.spawn_worker()
    }

    /// Stop the worker; pending calls fail with `BackendStopped`.
    pub fn stop(&self) -> bool {
        self.supervisor.stop()
    }

    pub fn status(&self) -> BackendStatus {
        let pid = self.supervisor.pid();
        BackendStatus {
            connected: pid.is_some(),
            pid,
        }
    }

    pub fn worker_state(&self) -> WorkerState {
        self.supervisor.state()
    }

    pub fn pending_requests(&self) -> usize {
        self.pipeline.correlator.pending_count()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&BridgeEvent) + Send + Sync + 'static,
    {
        self.pipeline.router.subscribe(handler)
    }

    pub fn subscribe_channel(&self) -> (SubscriptionId, crossbeam_channel::Receiver<BridgeEvent>) {
        self.pipeline.router.subscribe_channel()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.pipeline.router.unsubscribe(id)
    }

    /// Send a request and block for its result using the configured timeout.
    pub fn call(&self, kind: &str, payload: Value) -> CallResult {
        self.call_with_timeout(kind, payload, self.config.request_timeout)
    }

    pub fn call_with_timeout(&self, kind: &str, payload: Value, timeout: Duration) -> CallResult {
        self.submit(kind, payload, timeout)?.wait()
    }

    /// Send a request without waiting. The entry is registered before the line is
    /// written, so a fast response cannot slip past it.
    pub fn submit(
        &self,
        kind: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<PendingCall, BridgeError> {
        self.ensure_running()?;

        let id = self.next_request_id();
        let line = OutboundRequest::new(kind, id.as_str(), payload)
            .to_line()
            .map_err(|err| BridgeError::Serialize(err.to_string()))?;
        let call = self.pipeline.correlator.register(&id, timeout)?;

        log_debug_content(&format!("sending request: {}", line.trim_end()));
        if let Err(err) = self.supervisor.send(line.as_bytes()) {
            self.pipeline.correlator.reject(&id, err.clone());
            return Err(err);
        }
        tracing::debug!(request_id = %id, kind, "request sent");
        Ok(call)
    }

    // ------------------------------------------------------------------------
    // Worker command set
    // ------------------------------------------------------------------------

    pub fn process_audio(
        &self,
        request: &ProcessAudioRequest,
    ) -> Result<ProcessAudioResult, BridgeError> {
        let payload =
            serde_json::to_value(request).map_err(|err| BridgeError::Serialize(err.to_string()))?;
        let data = self.call(PROCESS_AUDIO, payload)?;
        decode_data(PROCESS_AUDIO, data)
    }

    /// Round-trip a `ping` and report how long it took.
    pub fn ping(&self) -> Result<Duration, BridgeError> {
        let started = Instant::now();
        self.call(PING, json!({}))?;
        Ok(started.elapsed())
    }

    pub fn worker_status(&self) -> Result<WorkerStatus, BridgeError> {
        let data = self.call(GET_STATUS, json!({}))?;
        decode_data(GET_STATUS, data)
    }

    /// Ask the worker to exit on its own, then reap it.
    pub fn request_shutdown(&self) -> Result<(), BridgeError> {
        self.pipeline.shutdown_requested.store(true, Ordering::SeqCst);
        let outcome = self.call(STOP, json!({}));
        if outcome.is_err() {
            self.pipeline.shutdown_requested.store(false, Ordering::SeqCst);
        }
        outcome?;
        self.supervisor.stop();
        Ok(())
    }

    // ------------------------------------------------------------------------

    fn spawn_worker(&self) -> Result<u32, BridgeError> {
        let observer: Arc<dyn WorkerObserver> = self.pipeline.clone();
        self.supervisor.start(&self.config.command, observer)
    }

    fn ensure_running(&self) -> Result<(), BridgeError> {
        match self.supervisor.state() {
            WorkerState::Running { .. } => Ok(()),
            WorkerState::Exited { .. }
                if self.config.restart_policy == RestartPolicy::OnDemand
                    && self.pipeline.crashed() =>
            {
                log_debug("respawning worker after crash");
                tracing::info!("respawning worker on demand");
                match self.spawn_worker() {
                    Ok(_) | Err(BridgeError::AlreadyRunning { .. }) => Ok(()),
                    Err(err) => Err(err),
                }
            }
            _ => Err(BridgeError::BackendUnavailable),
        }
    }

    fn next_request_id(&self) -> String {
        let n = self.next_request.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{n}", self.session_tag)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.supervisor.stop();
    }
}

fn decode_data<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, BridgeError> {
    serde_json::from_value(data)
        .map_err(|err| BridgeError::InvalidResponse(format!("{kind}: {err}")))
}
