//! Worker process lifecycle.
//!
//! Owns at most one child at a time. Stdout is framed and classified on a dedicated
//! reader thread, stderr is forwarded line by line, and stdin writes go through a
//! single mutex so concurrent requests never interleave on the wire. A watcher thread
//! polls the child so an exit is noticed even while a descendant keeps stdout open.

use crate::{lock_or_recover, log_debug, log_debug_content};
use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use super::error::BridgeError;
use super::framer::{LineFramer, MAX_LINE_BYTES};
use super::protocol::{classify, InboundMessage};

/// Default time a worker gets to exit on its own after stdin closes.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_millis(2000);

const READ_CHUNK_BYTES: usize = 8 * 1024;
const TERM_GRACE: Duration = Duration::from_millis(500);
/// How long a worker that closed stdout may keep running before it is killed.
const REAP_WINDOW: Duration = Duration::from_millis(1000);
/// How long stdout may stay open after the worker itself exited.
const DRAIN_WINDOW: Duration = Duration::from_millis(250);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const WATCH_INTERVAL: Duration = Duration::from_millis(20);

// ============================================================================
// Launch description
// ============================================================================

/// Program, arguments, and environment used to spawn the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Files that must exist before spawning (e.g. the worker script).
    pub required_paths: Vec<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            required_paths: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn require_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.required_paths.push(path.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

pub(crate) fn is_path_like(command: &str) -> bool {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return false;
    }
    let path = Path::new(trimmed);
    path.is_absolute() || trimmed.contains('/') || trimmed.contains(std::path::MAIN_SEPARATOR)
}

/// Resolve `program` to an existing file, searching `PATH` for bare names.
pub fn resolve_executable(program: &str) -> Result<PathBuf, BridgeError> {
    let trimmed = program.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::ExecutableNotFound(PathBuf::from(program)));
    }
    if is_path_like(trimmed) {
        let path = PathBuf::from(trimmed);
        return if path.is_file() {
            Ok(path)
        } else {
            Err(BridgeError::ExecutableNotFound(path))
        };
    }

    let search = env::var_os("PATH").unwrap_or_default();
    for dir in env::split_paths(&search) {
        let candidate = dir.join(trimmed);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if cfg!(windows) {
            let with_exe = dir.join(format!("{trimmed}.exe"));
            if with_exe.is_file() {
                return Ok(with_exe);
            }
        }
    }
    Err(BridgeError::ExecutableNotFound(PathBuf::from(trimmed)))
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Starting,
    Running { pid: u32 },
    Exited { code: Option<i32> },
}

impl WorkerState {
    pub fn label(self) -> &'static str {
        match self {
            WorkerState::Stopped => "stopped",
            WorkerState::Starting => "starting",
            WorkerState::Running { .. } => "running",
            WorkerState::Exited { .. } => "exited",
        }
    }
}

/// How a worker went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    pub pid: u32,
    pub code: Option<i32>,
    /// True when the exit was requested through `stop()`.
    pub expected: bool,
}

/// Receives everything the worker produces.
///
/// Callbacks run on the supervisor's threads (or on the thread calling `start`/`stop`)
/// with no supervisor locks held, except `on_lost`.
pub trait WorkerObserver: Send + Sync {
    fn on_started(&self, _pid: u32) {}
    fn on_message(&self, message: InboundMessage);
    fn on_stderr(&self, line: String);

    /// The worker was taken out of service. Runs under the supervisor's state lock,
    /// before any other thread can see the new state, so it must not call back into
    /// the supervisor or into user code. Returns whether the exit was expected; the
    /// value is passed on to `on_exit`.
    fn on_lost(&self, exit: WorkerExit) -> bool {
        exit.expected
    }

    fn on_exit(&self, exit: WorkerExit);
}

type StdinSlot = Arc<Mutex<Option<ChildStdin>>>;

struct RunningWorker {
    generation: u64,
    pid: u32,
    child: Child,
    stdin: StdinSlot,
    observer: Arc<dyn WorkerObserver>,
    stdout_closed_at: Option<Instant>,
}

struct SupervisorState {
    state: WorkerState,
    worker: Option<RunningWorker>,
    generation: u64,
}

struct Inner {
    state: Mutex<SupervisorState>,
    lifecycle: Mutex<()>,
    stop_grace: Duration,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, SupervisorState> {
        lock_or_recover(&self.state, "supervisor state")
    }
}

// ============================================================================
// Supervisor
// ============================================================================

pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_GRACE)
    }
}

impl ProcessSupervisor {
    pub fn new(stop_grace: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SupervisorState {
                    state: WorkerState::Stopped,
                    worker: None,
                    generation: 0,
                }),
                lifecycle: Mutex::new(()),
                stop_grace,
            }),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.inner.lock_state().state
    }

    pub fn pid(&self) -> Option<u32> {
        match self.state() {
            WorkerState::Running { pid } => Some(pid),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pid().is_some()
    }

    /// Spawn the worker and start consuming its output.
    ///
    /// Fails with `AlreadyRunning` if a worker is live; stop it first.
    pub fn start(
        &self,
        command: &WorkerCommand,
        observer: Arc<dyn WorkerObserver>,
    ) -> Result<u32, BridgeError> {
        let lifecycle = lock_or_recover(&self.inner.lifecycle, "supervisor lifecycle");

        if let Some(worker) = self.inner.lock_state().worker.as_ref() {
            return Err(BridgeError::AlreadyRunning { pid: worker.pid });
        }

        let program = resolve_executable(&command.program)?;
        if let Some(missing) = command.required_paths.iter().find(|path| !path.exists()) {
            return Err(BridgeError::ExecutableNotFound(missing.clone()));
        }

        let generation = {
            let mut state = self.inner.lock_state();
            state.generation += 1;
            state.state = WorkerState::Starting;
            state.generation
        };

        let mut process = Command::new(&program);
        process
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            process.current_dir(dir);
        }
        for (key, value) in &command.env {
            process.env(key, value);
        }

        let spawned = process.spawn().and_then(|mut child| {
            match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
                (Some(stdin), Some(stdout), Some(stderr)) => Ok((child, stdin, stdout, stderr)),
                _ => {
                    let _ = child.kill();
                    let _ = child.wait();
                    Err(io::Error::other("worker stdio was not captured"))
                }
            }
        });
        let (child, stdin, stdout, stderr) = match spawned {
            Ok(parts) => parts,
            Err(err) => {
                self.inner.lock_state().state = WorkerState::Exited { code: None };
                log_debug(&format!("failed to spawn {}: {err}", program.display()));
                tracing::error!(program = %program.display(), error = %err, "worker spawn failed");
                return Err(BridgeError::SpawnFailed(err.to_string()));
            }
        };

        let pid = child.id();
        {
            let mut state = self.inner.lock_state();
            state.worker = Some(RunningWorker {
                generation,
                pid,
                child,
                stdin: Arc::new(Mutex::new(Some(stdin))),
                observer: Arc::clone(&observer),
                stdout_closed_at: None,
            });
            state.state = WorkerState::Running { pid };
        }
        drop(lifecycle);

        log_debug(&format!("worker started: {} (pid {pid})", program.display()));
        tracing::info!(pid, program = %program.display(), "worker started");
        observer.on_started(pid);

        let stdout_inner = Arc::clone(&self.inner);
        let stdout_observer = Arc::clone(&observer);
        thread::spawn(move || {
            match pump_stdout(stdout, stdout_observer.as_ref()) {
                Ok(bytes) => log_debug(&format!("worker stdout closed after {bytes} bytes")),
                Err(err) => log_debug(&format!("worker stdout read failed: {err}")),
            }
            mark_stdout_closed(&stdout_inner, generation);
        });

        let watch_inner = Arc::clone(&self.inner);
        thread::spawn(move || watch_exit(&watch_inner, generation));

        thread::spawn(move || pump_stderr(stderr, observer.as_ref(), MAX_LINE_BYTES));

        Ok(pid)
    }

    /// Write one newline-terminated line to the worker's stdin.
    pub fn send(&self, line: &[u8]) -> Result<(), BridgeError> {
        let slot = {
            let state = self.inner.lock_state();
            match (&state.state, &state.worker) {
                (WorkerState::Running { .. }, Some(worker)) => Arc::clone(&worker.stdin),
                _ => return Err(BridgeError::BackendUnavailable),
            }
        };

        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line);
        if !frame.ends_with(b"\n") {
            frame.push(b'\n');
        }

        let mut guard = lock_or_recover(&slot, "worker stdin");
        let stdin = guard.as_mut().ok_or(BridgeError::BackendUnavailable)?;
        stdin
            .write_all(&frame)
            .and_then(|()| stdin.flush())
            .map_err(|err| {
                log_debug(&format!("worker stdin write failed: {err}"));
                BridgeError::SendFailed(err.to_string())
            })
    }

    /// Terminate the worker. Returns false if nothing was running.
    pub fn stop(&self) -> bool {
        let lifecycle = lock_or_recover(&self.inner.lifecycle, "supervisor lifecycle");
        let worker = {
            let mut state = self.inner.lock_state();
            state.state = WorkerState::Stopped;
            let worker = state.worker.take();
            if let Some(worker) = &worker {
                worker.observer.on_lost(WorkerExit {
                    pid: worker.pid,
                    code: None,
                    expected: true,
                });
            }
            worker
        };
        let Some(mut worker) = worker else {
            return false;
        };

        close_stdin(&worker.stdin);
        let code = terminate(&mut worker.child, self.inner.stop_grace);
        drop(lifecycle);

        log_debug(&format!("worker {} stopped (code {code:?})", worker.pid));
        tracing::info!(pid = worker.pid, code = ?code, "worker stopped");
        worker.observer.on_exit(WorkerExit {
            pid: worker.pid,
            code,
            expected: true,
        });
        true
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Reader loops
// ============================================================================

/// Frame and classify everything `reader` produces until EOF.
///
/// Returns the number of bytes consumed.
pub fn pump_stdout<R: Read>(mut reader: R, observer: &dyn WorkerObserver) -> io::Result<u64> {
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    let mut total: u64 = 0;
    let outcome = loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break Ok(total),
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => break Err(err),
        };
        total += n as u64;
        for line in framer.push(&buf[..n]) {
            observer.on_message(classify(&line));
        }
    };
    for line in framer.finish() {
        observer.on_message(classify(&line));
    }
    outcome
}

/// Forward stderr line by line. `\r` also ends a line so progress bars arrive as
/// they are drawn; a line longer than `limit` is dropped up to the next break.
fn pump_stderr<R: Read>(mut reader: R, observer: &dyn WorkerObserver, limit: usize) {
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    let mut line = Vec::new();
    let mut discarding = false;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                log_debug(&format!("worker stderr read failed: {err}"));
                break;
            }
        };
        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                if !discarding {
                    forward_stderr_line(&line, observer);
                }
                line.clear();
                discarding = false;
            } else if discarding {
                continue;
            } else if line.len() >= limit {
                log_debug(&format!(
                    "worker stderr line exceeded {limit} bytes; discarding it"
                ));
                line.clear();
                discarding = true;
            } else {
                line.push(byte);
            }
        }
    }
    if !discarding {
        forward_stderr_line(&line, observer);
    }
}

fn forward_stderr_line(raw: &[u8], observer: &dyn WorkerObserver) {
    let line = String::from_utf8_lossy(raw).trim_end().to_string();
    if line.trim().is_empty() {
        return;
    }
    log_debug_content(&format!("worker stderr: {line}"));
    observer.on_stderr(line);
}

fn mark_stdout_closed(inner: &Inner, generation: u64) {
    let mut state = inner.lock_state();
    if let Some(worker) = state
        .worker
        .as_mut()
        .filter(|worker| worker.generation == generation)
    {
        worker.stdout_closed_at = Some(Instant::now());
    }
}

// ============================================================================
// Exit watcher
// ============================================================================

/// Poll the child until it is gone, then take it out of service as a crash.
///
/// The worker is gone once it has exited and stdout has drained, once it has been
/// dead for `DRAIN_WINDOW` while a descendant still holds stdout, or once stdout has
/// been closed for `REAP_WINDOW` (the child is then killed). Returns early when
/// `stop()` or a newer generation took the slot.
fn watch_exit(inner: &Inner, generation: u64) {
    let mut exited: Option<(Option<i32>, Instant)> = None;
    loop {
        thread::sleep(WATCH_INTERVAL);
        let mut state = inner.lock_state();
        let Some(worker) = state
            .worker
            .as_mut()
            .filter(|worker| worker.generation == generation)
        else {
            return;
        };

        if exited.is_none() {
            match worker.child.try_wait() {
                Ok(Some(status)) => exited = Some((exit_code(status), Instant::now())),
                Ok(None) => {}
                Err(err) => log_debug(&format!("try_wait on worker failed: {err}")),
            }
        }

        let code = match (exited, worker.stdout_closed_at) {
            (Some((code, _)), Some(_)) => code,
            (Some((code, at)), None) if at.elapsed() >= DRAIN_WINDOW => {
                log_debug(&format!(
                    "worker {} exited but its stdout is still held open",
                    worker.pid
                ));
                code
            }
            (None, Some(at)) if at.elapsed() >= REAP_WINDOW => {
                log_debug(&format!(
                    "worker {} closed stdout but kept running; killing it",
                    worker.pid
                ));
                let _ = worker.child.kill();
                worker.child.wait().ok().and_then(exit_code)
            }
            _ => continue,
        };

        state.state = WorkerState::Exited { code };
        let Some(worker) = state.worker.take() else {
            return;
        };
        let expected = worker.observer.on_lost(WorkerExit {
            pid: worker.pid,
            code,
            expected: false,
        });
        drop(state);

        close_stdin(&worker.stdin);
        if expected {
            log_debug(&format!("worker {} exited (code {code:?})", worker.pid));
            tracing::info!(pid = worker.pid, code = ?code, "worker exited");
        } else {
            log_debug(&format!(
                "worker {} exited unexpectedly (code {code:?})",
                worker.pid
            ));
            tracing::error!(pid = worker.pid, code = ?code, "worker exited unexpectedly");
        }
        worker.observer.on_exit(WorkerExit {
            pid: worker.pid,
            code,
            expected,
        });
        return;
    }
}

// ============================================================================
// Process helpers
// ============================================================================

fn close_stdin(slot: &StdinSlot) {
    // A writer blocked on a full pipe holds the lock; killing the child releases it.
    match slot.try_lock() {
        Ok(mut guard) => {
            guard.take();
        }
        Err(_) => log_debug("worker stdin busy during shutdown; relying on termination"),
    }
}

fn exit_code(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(128 + signal);
        }
    }
    status.code()
}

fn wait_for_exit(child: &mut Child, limit: Duration) -> Option<ExitStatus> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(err) => {
                log_debug(&format!("try_wait on worker failed: {err}"));
                return None;
            }
        }
        if start.elapsed() >= limit {
            return None;
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}

/// Graceful stop: wait for a voluntary exit, then SIGTERM, then kill.
fn terminate(child: &mut Child, grace: Duration) -> Option<i32> {
    if let Some(status) = wait_for_exit(child, grace) {
        return exit_code(status);
    }
    request_termination(child);
    if let Some(status) = wait_for_exit(child, TERM_GRACE) {
        return exit_code(status);
    }
    if let Err(err) = child.kill() {
        log_debug(&format!("kill on worker failed: {err}"));
    }
    child.wait().ok().and_then(exit_code)
}

#[cfg(unix)]
fn request_termination(child: &mut Child) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: pid belongs to a child we have not reaped yet, so it cannot be recycled.
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        log_debug(&format!(
            "SIGTERM to worker failed: {}",
            io::Error::last_os_error()
        ));
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<InboundMessage>>,
        stderr: Mutex<Vec<String>>,
    }

    impl WorkerObserver for Recorder {
        fn on_message(&self, message: InboundMessage) {
            self.messages.lock().expect("messages").push(message);
        }
        fn on_stderr(&self, line: String) {
            self.stderr.lock().expect("stderr").push(line);
        }
        fn on_exit(&self, _exit: WorkerExit) {}
    }

    /// Hands out a fixed number of bytes per read call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(self.data.len()).min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    const STREAM: &[u8] = b"Script directory: /app\n\
{\"type\":\"log\",\"level\":\"info\",\"message\":\"Python bridge started\"}\n\
{\"type\":\"progress\",\"id\":\"r1\",\"progress\":5,\"message\":\"Starting\"}\n\
{\"type\":\"response\",\"id\":\"r1\",\"success\":true,\"data\":{\"ok\":1}}\n";

    #[test]
    fn pump_yields_same_messages_for_any_chunk_size() {
        let reference = Recorder::default();
        pump_stdout(Cursor::new(STREAM), &reference).expect("pump");
        let expected = reference.messages.lock().expect("messages").clone();
        assert_eq!(
            expected.iter().map(InboundMessage::label).collect::<Vec<_>>(),
            vec!["log", "progress", "response"]
        );

        for step in 1..=STREAM.len() {
            let recorder = Recorder::default();
            let bytes = pump_stdout(Trickle { data: STREAM, step }, &recorder).expect("pump");
            assert_eq!(bytes, STREAM.len() as u64);
            assert_eq!(*recorder.messages.lock().expect("messages"), expected, "step {step}");
        }
    }

    #[test]
    fn pump_flushes_unterminated_final_message() {
        let recorder = Recorder::default();
        pump_stdout(
            Cursor::new(&b"{\"type\":\"log\",\"message\":\"bye\"}"[..]),
            &recorder,
        )
        .expect("pump");
        assert_eq!(recorder.messages.lock().expect("messages").len(), 1);
    }

    #[test]
    fn pump_reports_malformed_without_stopping() {
        let recorder = Recorder::default();
        pump_stdout(
            Cursor::new(&b"{broken\n{\"type\":\"log\",\"message\":\"still here\"}\n"[..]),
            &recorder,
        )
        .expect("pump");
        let labels: Vec<&str> = recorder
            .messages
            .lock()
            .expect("messages")
            .iter()
            .map(InboundMessage::label)
            .collect();
        assert_eq!(labels, vec!["malformed", "log"]);
    }

    #[test]
    fn stderr_progress_bars_split_on_carriage_return() {
        let stream = b"10%|#    |\r55%|###  |\r100%|#####|\nDone\r\nno newline";
        for step in [1, 3, stream.len()] {
            let recorder = Recorder::default();
            pump_stderr(Trickle { data: stream, step }, &recorder, MAX_LINE_BYTES);
            assert_eq!(
                *recorder.stderr.lock().expect("stderr"),
                vec!["10%|#    |", "55%|###  |", "100%|#####|", "Done", "no newline"],
                "step {step}"
            );
        }
    }

    #[test]
    fn oversized_stderr_line_is_dropped() {
        let recorder = Recorder::default();
        pump_stderr(
            Cursor::new(&b"0123456789abcdef\n01234567\nok\n"[..]),
            &recorder,
            8,
        );
        assert_eq!(
            *recorder.stderr.lock().expect("stderr"),
            vec!["01234567", "ok"]
        );
    }

    #[test]
    fn missing_program_is_reported() {
        match resolve_executable("/definitely/not/here/python") {
            Err(BridgeError::ExecutableNotFound(path)) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here/python"));
            }
            other => panic!("expected ExecutableNotFound, got {other:?}"),
        }
        assert!(matches!(
            resolve_executable("no-such-worker-binary-xyz"),
            Err(BridgeError::ExecutableNotFound(_))
        ));
        assert!(matches!(
            resolve_executable("  "),
            Err(BridgeError::ExecutableNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn bare_names_resolve_on_path() {
        let resolved = resolve_executable("sh").expect("sh on PATH");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("sh"));
    }

    #[test]
    fn path_like_detection() {
        assert!(is_path_like("/usr/bin/python3"));
        assert!(is_path_like("venv/bin/python"));
        assert!(!is_path_like("python3"));
        assert!(!is_path_like(""));
    }

    #[test]
    fn send_without_worker_is_unavailable() {
        let supervisor = ProcessSupervisor::default();
        assert_eq!(
            supervisor.send(b"{\"type\":\"ping\"}"),
            Err(BridgeError::BackendUnavailable)
        );
        assert_eq!(supervisor.state(), WorkerState::Stopped);
        assert!(!supervisor.stop());
    }
}
