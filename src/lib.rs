//! Supervised JSON-lines bridge between a desktop shell and its processing worker.

pub mod config;
pub mod ipc;
mod lock;
mod logging;
pub mod telemetry;

pub(crate) use lock::lock_or_recover;
pub use logging::{
    crash_log_path, init_logging, install_panic_hook, log_debug, log_debug_content,
    log_file_path, log_panic,
};

pub use ipc::{
    BackendStatus, Bridge, BridgeConfig, BridgeError, BridgeEvent, PendingCall, RestartPolicy,
    SubscriptionId, WorkerCommand,
};
