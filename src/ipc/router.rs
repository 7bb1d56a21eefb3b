use crate::{lock_or_recover, log_debug};
use serde::Serialize;
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::protocol::{ProgressUpdate, WorkerLog};

// ============================================================================
// Events delivered to subscribers
// ============================================================================

/// Everything the bridge reports that is not a response to a specific call.
///
/// Serialized with an `"event"` tag so frontends can switch on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum BridgeEvent {
    #[serde(rename = "progress")]
    Progress(ProgressUpdate),

    #[serde(rename = "log")]
    Log(WorkerLog),

    /// Well-formed JSON the protocol does not recognize, passed through untouched.
    #[serde(rename = "unknown")]
    Unknown { message: Value },

    /// A line from the worker's stderr.
    #[serde(rename = "stderr")]
    Stderr { line: String },

    #[serde(rename = "worker_started")]
    WorkerStarted { pid: u32 },

    /// `expected` is true when the exit was requested through `stop()`.
    #[serde(rename = "worker_exited")]
    WorkerExited { code: Option<i32>, expected: bool },
}

// ============================================================================
// Router
// ============================================================================

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type EventHandler = Arc<dyn Fn(&BridgeEvent) + Send + Sync + 'static>;

/// Synchronous fan-out of worker events.
#[derive(Default)]
pub struct EventRouter {
    subscribers: Mutex<Vec<(SubscriptionId, EventHandler)>>,
    next_id: AtomicU64,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&BridgeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock_or_recover(&self.subscribers, "event subscribers").push((id, Arc::new(handler)));
        id
    }

    /// Subscribe through a channel instead of a callback.
    pub fn subscribe_channel(&self) -> (SubscriptionId, crossbeam_channel::Receiver<BridgeEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = lock_or_recover(&self.subscribers, "event subscribers");
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        lock_or_recover(&self.subscribers, "event subscribers").len()
    }

    /// Deliver `event` to every subscriber in subscription order.
    ///
    /// Returns how many handlers completed without panicking.
    pub fn publish(&self, event: &BridgeEvent) -> usize {
        let snapshot: Vec<(SubscriptionId, EventHandler)> =
            lock_or_recover(&self.subscribers, "event subscribers").clone();
        let mut delivered = 0;
        for (id, handler) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "non-string panic payload".to_string());
                    log_debug(&format!("event subscriber {} panicked: {reason}", id.0));
                    tracing::error!(subscriber = id.0, %reason, "event subscriber panicked");
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn progress(value: f64) -> BridgeEvent {
        BridgeEvent::Progress(ProgressUpdate {
            id: None,
            progress: value,
            message: String::new(),
        })
    }

    #[test]
    fn delivers_in_subscription_order() {
        let router = EventRouter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            router.subscribe(move |_| seen.lock().expect("seen").push(name));
        }
        assert_eq!(router.publish(&progress(1.0)), 3);
        assert_eq!(*seen.lock().expect("seen"), vec!["first", "second", "third"]);
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let router = EventRouter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        router.subscribe(|_| panic!("bad subscriber"));
        let counter = Arc::clone(&hits);
        router.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(router.publish(&progress(10.0)), 1);
        assert_eq!(router.publish(&progress(20.0)), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let router = EventRouter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let id = router.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        router.publish(&progress(1.0));
        assert!(router.unsubscribe(id));
        assert!(!router.unsubscribe(id));
        router.publish(&progress(2.0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(router.subscriber_count(), 0);
    }

    #[test]
    fn handler_may_unsubscribe_itself() {
        let router = Arc::new(EventRouter::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let inner_router = Arc::clone(&router);
        let inner_slot = Arc::clone(&slot);
        let id = router.subscribe(move |_| {
            if let Some(id) = *inner_slot.lock().expect("slot") {
                inner_router.unsubscribe(id);
            }
        });
        *slot.lock().expect("slot") = Some(id);
        assert_eq!(router.publish(&progress(1.0)), 1);
        assert_eq!(router.subscriber_count(), 0);
    }

    #[test]
    fn channel_subscription_receives_clones() {
        let router = EventRouter::new();
        let (_id, rx) = router.subscribe_channel();
        router.publish(&BridgeEvent::Stderr {
            line: "warming up".to_string(),
        });
        assert_eq!(
            rx.try_recv().expect("event"),
            BridgeEvent::Stderr {
                line: "warming up".to_string()
            }
        );
    }

    #[test]
    fn events_serialize_with_event_tag() {
        let value = serde_json::to_value(progress(42.0)).expect("encode");
        assert_eq!(value, json!({"event": "progress", "progress": 42.0, "message": ""}));

        let value = serde_json::to_value(BridgeEvent::WorkerExited {
            code: Some(1),
            expected: false,
        })
        .expect("encode");
        assert_eq!(
            value,
            json!({"event": "worker_exited", "code": 1, "expected": false})
        );
    }
}
