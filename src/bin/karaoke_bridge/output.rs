//! JSON-lines output on stdout. Every line is written whole under the stdout lock.

use karaoke_bridge::{log_debug, BridgeError, BridgeEvent};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Outcome<'a> {
    Result {
        request: &'a str,
        data: &'a Value,
    },
    Error {
        request: &'a str,
        code: &'static str,
        message: String,
        transport: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<&'a Value>,
    },
}

fn emit<T: Serialize>(value: &T) {
    let line = match serde_json::to_string(value) {
        Ok(line) => line,
        Err(err) => {
            log_debug(&format!("failed to encode output line: {err}"));
            return;
        }
    };
    let mut stdout = io::stdout().lock();
    if writeln!(stdout, "{line}").and_then(|()| stdout.flush()).is_err() {
        log_debug("stdout closed; dropping output line");
    }
}

pub(crate) fn print_event(event: &BridgeEvent) {
    emit(event);
}

pub(crate) fn print_result(request: &str, data: &Value) {
    emit(&Outcome::Result { request, data });
}

pub(crate) fn print_error(request: &str, err: &BridgeError) {
    let detail = match err {
        BridgeError::Worker(payload) if !payload.is_string() => Some(payload),
        _ => None,
    };
    emit(&Outcome::Error {
        request,
        code: err.code(),
        message: err.to_string(),
        transport: err.is_transport(),
        detail,
    });
}
