pub const DEFAULT_WORKER_CMD: &str = "python3";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_STOP_GRACE_MS: u64 = 2_000;
pub const DEFAULT_REQUEST: &str = "ping";

pub(super) const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
pub(super) const MAX_REQUEST_TIMEOUT_MS: u64 = 24 * 60 * 60 * 1000;
pub(super) const MAX_STOP_GRACE_MS: u64 = 60_000;
pub(super) const MAX_WORKER_ARGS: usize = 64;
pub(super) const MAX_WORKER_ARG_BYTES: usize = 8 * 1024;
pub(super) const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

// Packaged layout: <bundle>/python/... next to <bundle>/backend/python_bridge.py.
pub(super) const BUNDLED_PYTHON_UNIX: &str = "python/bin/python";
pub(super) const BUNDLED_PYTHON_WINDOWS: &str = "python/Scripts/python.exe";
pub(super) const BUNDLED_SCRIPT: &str = "backend/python_bridge.py";
// Development layout: <project>/venv/... with the script under backend/.
pub(super) const DEV_VENV_PYTHON_UNIX: &str = "venv/bin/python";
pub(super) const DEV_VENV_PYTHON_WINDOWS: &str = "venv/Scripts/python.exe";

pub(super) const WHISPER_MODELS: &[&str] = &[
    "tiny", "tiny.en", "base", "base.en", "small", "small.en", "medium", "medium.en", "large",
    "large-v1", "large-v2", "large-v3", "turbo",
];
