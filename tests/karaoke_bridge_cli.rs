use serde_json::Value;
use std::process::{Command, Output};

fn combined_output(output: &Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn bridge_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_karaoke-bridge").expect("karaoke-bridge test binary not built")
}

fn stdout_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
        .collect()
}

fn bridge_command() -> Command {
    let mut command = Command::new(bridge_bin());
    command
        .env_remove("KARAOKE_WORKER_CMD")
        .env_remove("KARAOKE_WORKER_SCRIPT")
        .env_remove("KARAOKE_WORKER_DIR")
        .env_remove("KARAOKE_BUNDLE_DIR")
        .arg("--no-logs");
    command
}

#[cfg(unix)]
fn write_stub_worker(contents: &str) -> std::path::PathBuf {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "karaoke_bridge_cli_stub_{}_{nanos}.sh",
        std::process::id()
    ));
    fs::write(&path, contents).expect("write stub");
    let mut perms = fs::metadata(&path).expect("stat stub").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub");
    path
}

#[test]
fn help_mentions_worker_flags() {
    let output = Command::new(bridge_bin())
        .arg("--help")
        .output()
        .expect("run karaoke-bridge --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("--worker-cmd"));
    assert!(combined.contains("--restart-policy"));
}

#[test]
fn missing_worker_is_reported_as_json_error() {
    let output = bridge_command()
        .args(["--worker-cmd", "/nonexistent/karaoke/python3"])
        .output()
        .expect("run karaoke-bridge");
    assert_eq!(output.status.code(), Some(1));
    let lines = stdout_lines(&output);
    let last = lines.last().expect("error line");
    assert_eq!(last["event"], "error");
    assert_eq!(last["code"], "executable_not_found");
    assert_eq!(last["transport"], true);
}

#[test]
fn invalid_config_exits_with_usage_error() {
    let output = bridge_command()
        .args(["--request-timeout-ms", "1"])
        .output()
        .expect("run karaoke-bridge");
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--request-timeout-ms"));
}

#[cfg(unix)]
#[test]
fn ping_prints_events_then_result() {
    let worker = write_stub_worker(
        r#"#!/bin/sh
printf '{"type":"log","level":"info","message":"Python bridge started"}\n'
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id":"\([^"]*\)".*/\1/p')
  printf '{"type":"progress","id":"%s","progress":100,"message":"done"}\n' "$id"
  printf '{"type":"response","id":"%s","success":true,"data":{"message":"pong"}}\n' "$id"
done
"#,
    );
    let output = bridge_command()
        .args(["--worker-cmd", worker.to_str().expect("utf8 path")])
        .args(["--request", "ping"])
        .output()
        .expect("run karaoke-bridge");
    assert!(output.status.success(), "{}", combined_output(&output));

    let lines = stdout_lines(&output);
    assert_eq!(lines.first().expect("first line")["event"], "worker_started");
    assert!(lines.iter().any(|line| line["event"] == "progress"));
    let last = lines.last().expect("result line");
    assert_eq!(last["event"], "result");
    assert_eq!(last["request"], "ping");
    assert_eq!(last["data"]["message"], "pong");
}

#[cfg(unix)]
#[test]
fn worker_failure_exits_nonzero() {
    let worker = write_stub_worker(
        r#"#!/bin/sh
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id":"\([^"]*\)".*/\1/p')
  printf '{"type":"response","id":"%s","success":false,"error":"Input file not found"}\n' "$id"
done
"#,
    );
    let output = bridge_command()
        .args(["--worker-cmd", worker.to_str().expect("utf8 path")])
        .args(["--request", "process_audio"])
        .args(["--input-file", "missing.mp3", "--output-dir", "out"])
        .output()
        .expect("run karaoke-bridge");
    assert_eq!(output.status.code(), Some(1));
    let lines = stdout_lines(&output);
    let last = lines.last().expect("error line");
    assert_eq!(last["event"], "error");
    assert_eq!(last["code"], "worker_error");
    assert_eq!(last["message"], "Input file not found");
    assert_eq!(last["transport"], false);
}
