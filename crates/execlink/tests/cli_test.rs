//! Integration tests for the `execlink` CLI binary.
//!
//! Argument parsing, help output, completions and error exit codes, plus a
//! few end-to-end runs against a mock backend. Every command runs with its
//! config, data and session paths inside a temp dir.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `execlink` binary rooted at `home`.
fn execlink_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("execlink");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("EXECLINK_PASSWORD")
        .env_remove("EXECLINK_CONNECTION__HOST")
        .env_remove("EXECLINK_CONNECTION__BASE_PORT")
        .env_remove("EXECLINK_SESSION__BACKEND")
        .env_remove("EXECLINK_SESSION__PATH");
    cmd
}

/// Point discovery at exactly one port with one quick retry.
fn single_port(cmd: &mut assert_cmd::Command, port: u16) {
    cmd.env("EXECLINK_CONNECTION__HOST", "127.0.0.1")
        .env("EXECLINK_CONNECTION__BASE_PORT", port.to_string())
        .env("EXECLINK_CONNECTION__CANDIDATE_COUNT", "1")
        .env("EXECLINK_CONNECTION__MAX_RETRIES", "1")
        .env("EXECLINK_CONNECTION__RETRY_DELAY_MS", "10")
        .env("EXECLINK_CONNECTION__PROBE_TIMEOUT_MS", "1000");
}

/// Store a signed-in session and point the file backend at it.
fn signed_in(cmd: &mut assert_cmd::Command, home: &Path) {
    let session = home.join("session.toml");
    std::fs::write(
        &session,
        "auth-token = \"tok-123\"\n\n[user]\nusername = \"alice\"\nemail = \"alice@example.com\"\n",
    )
    .unwrap();
    cmd.env("EXECLINK_SESSION__PATH", session);
}

/// A port nothing is listening on.
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn mount_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/port-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "port": "",
            "status": "connected",
            "tcpPort": 9000,
            "injectorStatus": {
                "injected": false,
                "injectedPID": 0,
                "injectedAt": "0001-01-01T00:00:00Z",
                "features": [
                    { "name": "anti_debug", "description": "Block debuggers", "enabled": true }
                ]
            },
            "hwid": { "originalHWID": "ORIG", "currentHWID": "ORIG", "spoofed": false }
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_usage() {
    let home = tempfile::tempdir().unwrap();
    let output = execlink_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "expected usage in:\n{stderr}");
}

#[test]
fn help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    execlink_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("exec")
                .and(predicate::str::contains("inject"))
                .and(predicate::str::contains("spoof-hwid"))
                .and(predicate::str::contains("console")),
        );
}

#[test]
fn version_flag() {
    let home = tempfile::tempdir().unwrap();
    execlink_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("execlink"));
}

#[test]
fn completions_bash() {
    let home = tempfile::tempdir().unwrap();
    execlink_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("execlink"));
}

#[test]
fn unknown_output_format_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    execlink_cmd(home.path())
        .args(["--output", "xml", "whoami"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_path_points_into_config_home() {
    let home = tempfile::tempdir().unwrap();
    execlink_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_show_applies_overrides() {
    let home = tempfile::tempdir().unwrap();
    execlink_cmd(home.path())
        .args(["--port", "9100", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_port = 9100"));
}

#[test]
fn config_show_json() {
    let home = tempfile::tempdir().unwrap();
    let output = execlink_cmd(home.path())
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["connection"]["base_port"], 8080);
    assert_eq!(value["session"]["backend"], "file");
}

// ── Session ─────────────────────────────────────────────────────────

#[test]
fn whoami_without_session_needs_login() {
    let home = tempfile::tempdir().unwrap();
    execlink_cmd(home.path())
        .arg("whoami")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("execlink login"));
}

#[test]
fn whoami_reads_stored_session() {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    signed_in(&mut cmd, home.path());
    cmd.args(["-o", "plain", "whoami"])
        .assert()
        .success()
        .stdout("alice\n");
}

#[test]
fn logout_removes_stored_session() {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    signed_in(&mut cmd, home.path());
    cmd.arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out successfully"));
    assert!(!home.path().join("session.toml").exists());
}

#[test]
fn blank_login_is_rejected_before_discovery() {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    single_port(&mut cmd, free_port());
    cmd.args(["login", " ", "--password", "secret"])
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("Please fill in all required fields")
                .and(predicate::str::contains("Server is not running").not()),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_login_sends_no_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/port-status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    single_port(&mut cmd, server.address().port());
    cmd.args(["login", "alice", "--password", ""]).assert().code(2);
}

// ── Commands ────────────────────────────────────────────────────────

#[test]
fn exec_without_session_fails_before_discovery() {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    single_port(&mut cmd, free_port());
    cmd.args(["exec", "print('hi')"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication required"));
}

#[test]
fn empty_process_name_is_rejected_locally() {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    signed_in(&mut cmd, home.path());
    single_port(&mut cmd, free_port());
    cmd.args(["inject", " "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Please enter a process name"));
}

#[test]
fn exec_with_no_backend_reports_not_running() {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    signed_in(&mut cmd, home.path());
    single_port(&mut cmd, free_port());
    cmd.args(["exec", "print('hi')"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Server is not running"));
}

#[tokio::test(flavor = "multi_thread")]
async fn exec_prints_backend_output() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .and(header("Authorization", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "hello" })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    signed_in(&mut cmd, home.path());
    single_port(&mut cmd, server.address().port());
    cmd.args(["exec", "print('hello')"])
        .assert()
        .success()
        .stdout("hello\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn status_plain_prints_backend_state() {
    let server = MockServer::start().await;
    mount_status(&server).await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    single_port(&mut cmd, server.address().port());
    cmd.args(["-o", "plain", "status"])
        .assert()
        .success()
        .stdout("connected\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_session_is_cleared_on_401() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    Mock::given(method("GET"))
        .and(path("/features"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    signed_in(&mut cmd, home.path());
    single_port(&mut cmd, server.address().port());
    cmd.args(["features", "list"]).assert().code(3);
    assert!(!home.path().join("session.toml").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn console_rediscovers_when_stream_never_opens() {
    // One good probe, then the backend stops answering. `/ws` is not served,
    // so the handshake after the first discovery fails.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/port-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "port": "",
            "status": "connected",
            "tcpPort": 9000
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = execlink_cmd(home.path());
    single_port(&mut cmd, server.address().port());
    cmd.arg("console")
        .timeout(Duration::from_secs(30))
        .assert()
        .code(7)
        .stdout(
            predicate::str::contains("WebSocket connection error")
                .and(predicate::str::contains("===== Connection Attempt Started =====")),
        );
}
