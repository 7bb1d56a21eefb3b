//! Headless stand-in for the desktop shell.
//!
//! Starts the worker, sends one request, and prints every bridge event followed by a
//! final `result` or `error` line, all as JSON on stdout.

mod output;

use anyhow::Result;
use karaoke_bridge::config::AppConfig;
use karaoke_bridge::ipc::STOP;
use karaoke_bridge::telemetry::init_tracing;
use karaoke_bridge::{init_logging, install_panic_hook, log_debug, log_file_path, Bridge};
use serde_json::json;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    install_panic_hook();
    let tracing_active = init_tracing(&config);
    log_debug("=== karaoke-bridge started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));
    log_debug(&format!("tracing active: {tracing_active}"));

    let (request, payload) = config.request()?;
    let bridge = Bridge::new(config.bridge_config()?);
    let subscription = bridge.subscribe(output::print_event);

    if let Err(err) = bridge.start() {
        log_debug(&format!("worker failed to start: {err}"));
        output::print_error(&request, &err);
        return Ok(ExitCode::FAILURE);
    }

    let outcome = if request == STOP {
        bridge.request_shutdown().map(|()| json!({"stopped": true}))
    } else {
        bridge.call(&request, payload)
    };
    bridge.stop();
    bridge.unsubscribe(subscription);

    match outcome {
        Ok(data) => {
            output::print_result(&request, &data);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            log_debug(&format!("request {request} failed: {err}"));
            output::print_error(&request, &err);
            Ok(ExitCode::FAILURE)
        }
    }
}
