use super::defaults::{
    BUNDLED_PYTHON_UNIX, BUNDLED_PYTHON_WINDOWS, BUNDLED_SCRIPT, DEFAULT_WORKER_CMD,
    DEV_VENV_PYTHON_UNIX, DEV_VENV_PYTHON_WINDOWS, MAX_PAYLOAD_BYTES, MAX_REQUEST_TIMEOUT_MS,
    MAX_STOP_GRACE_MS, MAX_WORKER_ARGS, MAX_WORKER_ARG_BYTES, MIN_REQUEST_TIMEOUT_MS,
    WHISPER_MODELS,
};
use super::AppConfig;
use crate::ipc::{
    BridgeConfig, ProcessAudioOptions, ProcessAudioRequest, WorkerCommand, PROCESS_AUDIO,
};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize strings.
    pub fn validate(&mut self) -> Result<()> {
        if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            bail!(
                "--request-timeout-ms must be between {MIN_REQUEST_TIMEOUT_MS} and {MAX_REQUEST_TIMEOUT_MS}, got {}",
                self.request_timeout_ms
            );
        }
        if self.stop_grace_ms > MAX_STOP_GRACE_MS {
            bail!(
                "--stop-grace-ms must be at most {MAX_STOP_GRACE_MS}, got {}",
                self.stop_grace_ms
            );
        }

        self.worker_cmd = self.worker_cmd.trim().to_string();
        let words = split_worker_cmd(&self.worker_cmd)?;

        // Keep argv small; the worker only ever needs a handful of flags.
        let arg_count = words.len() - 1 + self.worker_args.len();
        if arg_count > MAX_WORKER_ARGS {
            bail!("too many worker arguments (max {MAX_WORKER_ARGS}, got {arg_count})");
        }
        let total_arg_bytes: usize = words
            .iter()
            .skip(1)
            .chain(self.worker_args.iter())
            .map(String::len)
            .sum();
        if total_arg_bytes > MAX_WORKER_ARG_BYTES {
            bail!("combined worker arguments exceed {MAX_WORKER_ARG_BYTES} bytes");
        }

        if let Some(dir) = &self.bundle_dir {
            ensure_dir(dir, "--bundle-dir")?;
        }
        if let Some(dir) = &self.worker_dir {
            ensure_dir(dir, "--worker-dir")?;
        }

        self.request = self.request.trim().to_string();
        if self.request.is_empty()
            || !self
                .request
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
        {
            bail!(
                "--request must be a lowercase request type like 'process_audio', got '{}'",
                self.request
            );
        }

        if let Some(model) = &self.whisper_model {
            if !WHISPER_MODELS.contains(&model.as_str()) {
                bail!("--whisper-model must be one of {WHISPER_MODELS:?}, got '{model}'");
            }
        }
        if let Some(url) = &self.youtube_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                bail!("--youtube-url must be an http(s) URL, got '{url}'");
            }
        }

        match &self.payload {
            Some(raw) => {
                if raw.len() > MAX_PAYLOAD_BYTES {
                    bail!("--payload exceeds {MAX_PAYLOAD_BYTES} bytes");
                }
                let value: Value =
                    serde_json::from_str(raw).context("--payload must be valid JSON")?;
                if !value.is_object() {
                    bail!("--payload must be a JSON object");
                }
            }
            None if self.request == PROCESS_AUDIO => {
                if self.input_file.is_none() && self.youtube_url.is_none() {
                    bail!("process_audio needs --input-file or --youtube-url");
                }
                if self
                    .output_dir
                    .as_deref()
                    .map_or(true, |dir| dir.trim().is_empty())
                {
                    bail!("process_audio needs --output-dir");
                }
            }
            None => {}
        }

        Ok(())
    }

    /// Resolve how to launch the worker: packaged bundle, dev checkout, or plain command.
    pub fn worker_command(&self) -> Result<WorkerCommand> {
        if let Some(bundle) = &self.bundle_dir {
            let python = bundle.join(if cfg!(windows) {
                BUNDLED_PYTHON_WINDOWS
            } else {
                BUNDLED_PYTHON_UNIX
            });
            let script = self
                .worker_script
                .clone()
                .unwrap_or_else(|| bundle.join(BUNDLED_SCRIPT));
            return Ok(WorkerCommand::new(path_string(&python)?)
                .arg(path_string(&script)?)
                .require_path(script)
                .args(self.worker_args.iter().cloned())
                .working_dir(bundle));
        }

        let mut words = split_worker_cmd(&self.worker_cmd)?;
        let mut program = words.remove(0);
        let dev_dir = self
            .worker_dir
            .as_ref()
            .filter(|_| program == DEFAULT_WORKER_CMD);
        if let Some(dir) = dev_dir {
            let venv_python = dir.join(if cfg!(windows) {
                DEV_VENV_PYTHON_WINDOWS
            } else {
                DEV_VENV_PYTHON_UNIX
            });
            if venv_python.is_file() {
                program = path_string(&venv_python)?;
            }
        }

        let mut command = WorkerCommand::new(program).args(words);
        if let Some(script) = self.script_path() {
            command = command.arg(path_string(&script)?).require_path(script);
        }
        command = command.args(self.worker_args.iter().cloned());
        if let Some(dir) = &self.worker_dir {
            command = command.working_dir(dir);
        }
        Ok(command)
    }

    pub fn bridge_config(&self) -> Result<BridgeConfig> {
        Ok(BridgeConfig::new(self.worker_command()?)
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
            .with_stop_grace(Duration::from_millis(self.stop_grace_ms))
            .with_restart_policy(self.restart_policy))
    }

    /// Request type and payload the CLI should send.
    pub fn request(&self) -> Result<(String, Value)> {
        if let Some(raw) = &self.payload {
            let payload = serde_json::from_str(raw).context("--payload must be valid JSON")?;
            return Ok((self.request.clone(), payload));
        }
        if self.request == PROCESS_AUDIO {
            let output_dir = self
                .output_dir
                .clone()
                .ok_or_else(|| anyhow!("process_audio needs --output-dir"))?;
            let request = ProcessAudioRequest {
                input_file: self.input_file.clone(),
                youtube_url: self.youtube_url.clone(),
                output_dir,
                options: ProcessAudioOptions {
                    enhance_instrumental: self.enhance_instrumental,
                    whisper_model: self.whisper_model.clone(),
                },
            };
            return Ok((PROCESS_AUDIO.to_string(), serde_json::to_value(&request)?));
        }
        Ok((self.request.clone(), json!({})))
    }

    /// Explicit script, resolved against `--worker-dir`, or the checkout's backend script.
    fn script_path(&self) -> Option<PathBuf> {
        match (&self.worker_script, &self.worker_dir) {
            (Some(script), Some(dir)) if script.is_relative() => Some(dir.join(script)),
            (Some(script), _) => Some(script.clone()),
            (None, Some(dir)) => {
                let candidate = dir.join(BUNDLED_SCRIPT);
                candidate.is_file().then_some(candidate)
            }
            (None, None) => None,
        }
    }
}

pub(super) fn split_worker_cmd(raw: &str) -> Result<Vec<String>> {
    let words =
        shell_words::split(raw).with_context(|| format!("failed to parse --worker-cmd '{raw}'"))?;
    if words.is_empty() {
        bail!("--worker-cmd cannot be empty");
    }
    Ok(words)
}

fn ensure_dir(path: &Path, flag: &str) -> Result<()> {
    if !path.is_dir() {
        bail!("{flag} '{}' is not a directory", path.display());
    }
    Ok(())
}

fn path_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("path '{}' must be valid UTF-8", path.display()))
}
