//! Pending-request table.
//!
//! Every outbound request gets an entry keyed by its id. The entry is removed exactly
//! once, by whichever of {matching response, deadline, cancel_all} gets the table lock
//! first; everyone else finds the id gone and does nothing.

use crate::lock::{wait_or_recover, wait_timeout_or_recover};
use crate::{lock_or_recover, log_debug};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use super::error::BridgeError;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(300_000);

/// Fallback horizon when `now + timeout` overflows `Instant`.
const FAR_DEADLINE: Duration = Duration::from_secs(86_400 * 365);

pub type CallResult = Result<Value, BridgeError>;

struct PendingEntry {
    created_at: Instant,
    timeout: Duration,
    deadline: Instant,
    reply: mpsc::Sender<CallResult>,
}

#[derive(Default)]
struct Table {
    entries: HashMap<String, PendingEntry>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    table: Mutex<Table>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Table> {
        lock_or_recover(&self.table, "correlator table")
    }
}

/// Tracks in-flight requests and expires them on their deadlines.
pub struct RequestCorrelator {
    shared: Arc<Shared>,
    reaper: Option<thread::JoinHandle<()>>,
}

impl Default for RequestCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCorrelator {
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        let reaper_shared = Arc::clone(&shared);
        let reaper = thread::spawn(move || run_reaper(&reaper_shared));
        Self {
            shared,
            reaper: Some(reaper),
        }
    }

    /// Insert a pending entry and arm its deadline.
    pub fn register(&self, id: &str, timeout: Duration) -> Result<PendingCall, BridgeError> {
        let (reply, receiver) = mpsc::channel();
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_DEADLINE);
        {
            let mut table = self.shared.lock();
            if table.shutdown {
                return Err(BridgeError::BackendUnavailable);
            }
            if table.entries.contains_key(id) {
                return Err(BridgeError::DuplicateRequestId(id.to_string()));
            }
            table.entries.insert(
                id.to_string(),
                PendingEntry {
                    created_at: now,
                    timeout,
                    deadline,
                    reply,
                },
            );
        }
        self.shared.wake.notify_all();
        Ok(PendingCall {
            id: id.to_string(),
            receiver,
            timeout,
        })
    }

    /// Deliver a successful result. Returns false if `id` was not pending.
    pub fn resolve(&self, id: &str, payload: Value) -> bool {
        self.complete(id, Ok(payload))
    }

    /// Deliver a failure. Returns false if `id` was not pending.
    pub fn reject(&self, id: &str, error: BridgeError) -> bool {
        self.complete(id, Err(error))
    }

    /// Reject every pending request with `reason` and empty the table.
    pub fn cancel_all(&self, reason: &BridgeError) -> usize {
        let drained: Vec<(String, PendingEntry)> = self.shared.lock().entries.drain().collect();
        let count = drained.len();
        for (id, entry) in drained {
            log_debug(&format!(
                "cancelling request {id} after {} ms: {reason}",
                entry.created_at.elapsed().as_millis()
            ));
            let _ = entry.reply.send(Err(reason.clone()));
        }
        if count > 0 {
            tracing::warn!(cancelled = count, reason = reason.code(), "pending requests cancelled");
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.shared.lock().entries.len()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.shared.lock().entries.contains_key(id)
    }

    fn complete(&self, id: &str, result: CallResult) -> bool {
        let entry = self.shared.lock().entries.remove(id);
        match entry {
            Some(entry) => {
                // The caller may have dropped its handle; the entry is gone either way.
                let _ = entry.reply.send(result);
                true
            }
            None => false,
        }
    }
}

impl Drop for RequestCorrelator {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();
        if let Some(handle) = self.reaper.take() {
            let _ = handle.join();
        }
        self.cancel_all(&BridgeError::BackendUnavailable);
    }
}

fn run_reaper(shared: &Shared) {
    let mut table = shared.lock();
    loop {
        if table.shutdown {
            return;
        }

        let now = Instant::now();
        let expired_ids: Vec<String> = table
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        if !expired_ids.is_empty() {
            let expired: Vec<(String, PendingEntry)> = expired_ids
                .into_iter()
                .filter_map(|id| table.entries.remove(&id).map(|entry| (id, entry)))
                .collect();
            drop(table);
            for (id, entry) in expired {
                log_debug(&format!(
                    "request {id} timed out after {} ms",
                    entry.timeout.as_millis()
                ));
                tracing::warn!(
                    request_id = %id,
                    timeout_ms = entry.timeout.as_millis() as u64,
                    "request timed out"
                );
                let _ = entry.reply.send(Err(BridgeError::RequestTimeout {
                    id,
                    timeout: entry.timeout,
                }));
            }
            table = shared.lock();
            continue;
        }

        let next_deadline = table.entries.values().map(|entry| entry.deadline).min();
        table = match next_deadline {
            Some(deadline) => wait_timeout_or_recover(
                &shared.wake,
                table,
                deadline.saturating_duration_since(now),
                "correlator reaper",
            ),
            None => wait_or_recover(&shared.wake, table, "correlator reaper"),
        };
    }
}

/// Caller's side of a pending request. The result is delivered once.
#[derive(Debug)]
pub struct PendingCall {
    id: String,
    receiver: mpsc::Receiver<CallResult>,
    timeout: Duration,
}

impl PendingCall {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Block until the request resolves, is rejected, or times out.
    pub fn wait(self) -> CallResult {
        self.receiver
            .recv()
            .unwrap_or(Err(BridgeError::BackendUnavailable))
    }

    /// Block for at most `limit`; `None` means still pending.
    pub fn wait_timeout(&self, limit: Duration) -> Option<CallResult> {
        match self.receiver.recv_timeout(limit) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(BridgeError::BackendUnavailable)),
        }
    }

    /// Non-blocking poll; `None` means still pending.
    pub fn try_result(&self) -> Option<CallResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(BridgeError::BackendUnavailable)),
        }
    }
}
