use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<bool> = OnceLock::new();

/// JSON-lines trace file. `KARAOKE_BRIDGE_TRACE_LOG` overrides the temp-dir default.
pub fn tracing_log_path() -> PathBuf {
    env::var("KARAOKE_BRIDGE_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("karaoke_bridge_trace.jsonl"))
}

/// Install the global JSON subscriber once. Returns whether tracing is active.
pub fn init_tracing(config: &AppConfig) -> bool {
    if !config.logging_enabled() {
        return false;
    }

    *TRACING_INIT.get_or_init(|| {
        let path = tracing_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(err) => {
                crate::log_debug(&format!(
                    "trace log {} unavailable: {err}",
                    path.display()
                ));
                return false;
            }
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_max_level(tracing::Level::DEBUG)
            .with_thread_names(true)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    })
}
