//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use crate::ipc::RestartPolicy;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_REQUEST, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_STOP_GRACE_MS, DEFAULT_WORKER_CMD,
};

/// CLI options for the headless bridge. Validated values are safe to hand to the worker.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "karaoke-bridge",
    about = "Drive the karaoke processing worker over JSON lines",
    author,
    version
)]
pub struct AppConfig {
    /// Worker interpreter or executable, optionally with leading arguments
    #[arg(
        long = "worker-cmd",
        env = "KARAOKE_WORKER_CMD",
        default_value = DEFAULT_WORKER_CMD
    )]
    pub worker_cmd: String,

    /// Worker script passed as the first argument
    #[arg(long = "worker-script", env = "KARAOKE_WORKER_SCRIPT")]
    pub worker_script: Option<PathBuf>,

    /// Extra arguments appended after the script (repeatable)
    #[arg(
        long = "worker-arg",
        action = ArgAction::Append,
        value_name = "ARG",
        allow_hyphen_values = true
    )]
    pub worker_args: Vec<String>,

    /// Working directory for the worker (development checkout root)
    #[arg(long = "worker-dir", env = "KARAOKE_WORKER_DIR")]
    pub worker_dir: Option<PathBuf>,

    /// Packaged resources directory containing python/ and backend/
    #[arg(long = "bundle-dir", env = "KARAOKE_BUNDLE_DIR", conflicts_with = "worker_dir")]
    pub bundle_dir: Option<PathBuf>,

    /// Per-request deadline (milliseconds)
    #[arg(long = "request-timeout-ms", default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    /// Time the worker gets to exit after stdin closes before it is signalled (milliseconds)
    #[arg(long = "stop-grace-ms", default_value_t = DEFAULT_STOP_GRACE_MS)]
    pub stop_grace_ms: u64,

    /// What calls do after the worker crashed
    #[arg(long = "restart-policy", value_enum, default_value_t = RestartPolicy::Manual)]
    pub restart_policy: RestartPolicy,

    /// Request type to send (process_audio, ping, get_status, stop, ...)
    #[arg(long, default_value = DEFAULT_REQUEST)]
    pub request: String,

    /// Raw JSON payload for the request; overrides the process_audio flags
    #[arg(long)]
    pub payload: Option<String>,

    /// Local audio/video file to process
    #[arg(long = "input-file")]
    pub input_file: Option<String>,

    /// YouTube URL to download and process
    #[arg(long = "youtube-url", conflicts_with = "input_file")]
    pub youtube_url: Option<String>,

    /// Directory the worker writes its outputs to
    #[arg(long = "output-dir")]
    pub output_dir: Option<String>,

    /// Whisper model used for lyrics transcription
    #[arg(long = "whisper-model")]
    pub whisper_model: Option<String>,

    /// Run the instrumental enhancement pass
    #[arg(long = "enhance-instrumental", default_value_t = false)]
    pub enhance_instrumental: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "KARAOKE_BRIDGE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "KARAOKE_BRIDGE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Allow logging worker payloads and file paths (debug log only)
    #[arg(
        long = "log-content",
        env = "KARAOKE_BRIDGE_LOG_CONTENT",
        default_value_t = false
    )]
    pub log_content: bool,
}

impl AppConfig {
    pub fn logging_enabled(&self) -> bool {
        self.logs && !self.no_logs
    }
}
