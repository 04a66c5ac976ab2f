//! Basic CLI E2E tests.
//!
//! Each test runs the built `garden` binary against its own temporary data
//! directory and checks the JSON it prints.

use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

fn garden(home: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_garden"));
    cmd.args(args).env("GARDEN_HOME", home).env_remove("RUST_LOG");
    cmd
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = garden(home, args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?} printed non-JSON ({e}): {stdout}"))
}

#[test]
fn test_flowers_list() {
    let home = TempDir::new().unwrap();
    let flowers = run_json(home.path(), &["flowers", "list"]);
    let codes: Vec<&str> = flowers
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["code"].as_str().unwrap())
        .collect();
    assert!(codes.contains(&"daisy"));
    assert!(codes.contains(&"rose"));
}

#[test]
fn test_flowers_show_unknown_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["flowers", "show", "cactus"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cactus"));
}

#[test]
fn test_session_start_and_status() {
    let home = TempDir::new().unwrap();
    let started = run_json(home.path(), &["session", "start", "tulip", "--user", "ana"]);
    assert_eq!(started["type"], "SessionStarted");
    assert_eq!(started["flower_code"], "tulip");

    let status = run_json(home.path(), &["session", "status"]);
    assert_eq!(status["state"], "running");
    assert_eq!(status["stage"], "seed");
    assert_eq!(status["due"], false);
}

#[test]
fn test_session_start_unknown_flower() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["session", "start", "cactus"]);
    assert_eq!(code, 1);

    let status = run_json(home.path(), &["session", "status"]);
    assert_eq!(status["state"], "idle");
}

#[test]
fn test_session_pause_resume() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["session", "start", "daisy"]);

    let paused = run_json(home.path(), &["session", "pause"]);
    assert_eq!(paused["type"], "SessionPaused");
    let again = run_json(home.path(), &["session", "pause"]);
    assert_eq!(again["type"], "StateSnapshot");
    assert_eq!(again["state"], "paused");

    let resumed = run_json(home.path(), &["session", "resume"]);
    assert_eq!(resumed["type"], "SessionResumed");
}

#[test]
fn test_session_end_early_records_nothing() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["session", "start", "daisy"]);

    let outcome = run_json(home.path(), &["session", "end", "--early"]);
    assert_eq!(outcome["outcome"], "ended_early");
    assert_eq!(outcome["flower_code"], "daisy");

    let stats = run_json(home.path(), &["meadow", "stats"]);
    assert_eq!(stats["total"], 0);
}

#[test]
fn test_end_without_session() {
    let home = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(home.path(), &["session", "end"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("nothing_to_end"));
    assert!(stderr.contains("no active session"));
}

#[test]
fn test_completed_session_reaches_meadow() {
    let home = TempDir::new().unwrap();
    run_cli(home.path(), &["config", "set", "timer.session_length_secs", "1"]);
    run_json(home.path(), &["session", "start", "rose", "--user", "ana"]);

    let outcome = run_json(home.path(), &["session", "end"]);
    assert_eq!(outcome["outcome"], "completed");
    assert_eq!(outcome["record"]["user_name"], "ana");
    assert_eq!(outcome["persistence"]["status"], "saved");
    assert_eq!(outcome["tally"]["completed_sessions"], 1);

    let stats = run_json(home.path(), &["meadow", "stats"]);
    assert_eq!(stats["available"], true);
    assert_eq!(stats["per_flower_counts"]["rose"], 1);
    assert_eq!(stats["per_flower_counts"]["daisy"], 0);
}

#[test]
fn test_no_backend_still_counts_locally() {
    let home = TempDir::new().unwrap();
    run_cli(home.path(), &["config", "set", "backend.kind", "none"]);
    run_cli(home.path(), &["config", "set", "timer.session_length_secs", "1"]);
    run_json(home.path(), &["session", "start", "daisy"]);

    let (stdout, stderr, code) = run_cli(home.path(), &["session", "end"]);
    assert_eq!(code, 0);
    let outcome: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["persistence"]["status"], "not_configured");
    assert_eq!(outcome["tally"]["completed_sessions"], 1);
    assert!(stderr.contains("no session backend"));

    let stats = run_json(home.path(), &["meadow", "stats"]);
    assert_eq!(stats["available"], false);
}

#[test]
fn test_session_reset() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["session", "start", "lavender"]);
    let reset = run_json(home.path(), &["session", "reset"]);
    assert_eq!(reset["type"], "SessionReset");
    let again = run_json(home.path(), &["session", "reset"]);
    assert_eq!(again["type"], "StateSnapshot");
    assert_eq!(again["state"], "idle");

    let status = run_json(home.path(), &["session", "status"]);
    assert_eq!(status["state"], "idle");
}

#[test]
fn test_session_link_carries_nickname() {
    let home = TempDir::new().unwrap();
    run_cli(home.path(), &["config", "set", "user.name", "Ana Lu"]);
    let (stdout, _, code) = run_cli(home.path(), &["session", "link", "https://garden.example.com/"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "https://garden.example.com/?u=Ana+Lu");
}

#[test]
fn test_config_set_get() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "meadow.seed", "7"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "meadow.seed"]);
    assert_eq!(stdout.trim(), "7");

    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "timer.session_length_secs", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("timer.session_length_secs"));

    let (_, _, code) = run_cli(home.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_reset() {
    let home = TempDir::new().unwrap();
    run_cli(home.path(), &["config", "set", "meadow.seed", "7"]);
    let (_, _, code) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let config = run_json(home.path(), &["config", "list"]);
    assert_eq!(config["meadow"]["seed"], 42);
}

#[test]
fn test_meadow_render_writes_png() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("out.png");
    let result = run_json(home.path(), &["meadow", "render", "--out", out.to_str().unwrap()]);
    assert_eq!(result["flowers"], 0);
    assert!(out.exists());
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("garden"));
}

fn short_sessions(home: &Path, length_secs: &str) {
    for (key, value) in [
        ("timer.session_length_secs", length_secs),
        ("timer.tolerance_secs", "0"),
        ("timer.tick_interval_ms", "100"),
    ] {
        let (_, stderr, code) = run_cli(home, &["config", "set", key, value]);
        assert_eq!(code, 0, "config set {key} failed: {stderr}");
    }
}

#[test]
fn test_status_finishes_due_session_once() {
    let home = TempDir::new().unwrap();
    short_sessions(home.path(), "1");
    run_json(home.path(), &["session", "start", "daisy"]);
    thread::sleep(Duration::from_millis(1300));

    let (stdout, stderr, code) = run_cli(home.path(), &["session", "status"]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("\"due\": true"));
    assert!(stdout.contains("\"outcome\": \"completed\""));

    let status = run_json(home.path(), &["session", "status"]);
    assert_eq!(status["state"], "idle");
    let (stdout, _, _) = run_cli(home.path(), &["session", "end"]);
    assert!(stdout.contains("nothing_to_end"));

    let stats = run_json(home.path(), &["meadow", "stats"]);
    assert_eq!(stats["total"], 1);
}

#[test]
fn test_watch_completes_session() {
    let home = TempDir::new().unwrap();
    short_sessions(home.path(), "1");
    run_json(home.path(), &["session", "start", "tulip"]);

    let (stdout, stderr, code) = run_cli(home.path(), &["session", "watch", "--max-ticks", "50"]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("\"outcome\": \"completed\""));

    let stats = run_json(home.path(), &["meadow", "stats"]);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["per_flower_counts"]["tulip"], 1);
}

#[test]
fn test_watch_respects_pause_from_another_invocation() {
    let home = TempDir::new().unwrap();
    short_sessions(home.path(), "2");
    run_json(home.path(), &["session", "start", "daisy"]);

    let watch = garden(home.path(), &["session", "watch", "--max-ticks", "40"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    thread::sleep(Duration::from_millis(500));
    let paused = run_json(home.path(), &["session", "pause"]);
    assert_eq!(paused["type"], "SessionPaused");

    let output = watch.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("\"outcome\""));

    let status = run_json(home.path(), &["session", "status"]);
    assert_eq!(status["state"], "paused");
    let stats = run_json(home.path(), &["meadow", "stats"]);
    assert_eq!(stats["total"], 0);
}

#[test]
fn test_watch_stops_when_session_ends_elsewhere() {
    let home = TempDir::new().unwrap();
    short_sessions(home.path(), "30");
    run_json(home.path(), &["session", "start", "rose"]);

    let watch = garden(home.path(), &["session", "watch", "--max-ticks", "100"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    thread::sleep(Duration::from_millis(300));
    let outcome = run_json(home.path(), &["session", "end", "--early"]);
    assert_eq!(outcome["outcome"], "ended_early");

    let output = watch.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"StateSnapshot\""));
    assert!(!stdout.contains("\"completed\""));

    let stats = run_json(home.path(), &["meadow", "stats"]);
    assert_eq!(stats["total"], 0);
}

#[test]
fn test_start_while_active_keeps_nickname() {
    let home = TempDir::new().unwrap();
    short_sessions(home.path(), "1");
    run_json(home.path(), &["session", "start", "daisy", "--user", "ana"]);

    let (_, stderr, code) = run_cli(home.path(), &["session", "start", "tulip", "--user", "bob"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("already active"));
    thread::sleep(Duration::from_millis(1100));

    let outcome = run_json(home.path(), &["session", "end"]);
    assert_eq!(outcome["record"]["flower_code"], "daisy");
    assert_eq!(outcome["record"]["user_name"], "ana");
}

#[test]
fn test_corrupt_session_state_is_reported() {
    let home = TempDir::new().unwrap();
    garden_core::Database::open_at(&home.path().join("garden.db"))
        .unwrap()
        .kv_set("session_recorder", "{not json")
        .unwrap();

    let (stdout, stderr, code) = run_cli(home.path(), &["session", "status"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("warning: saved session state is unreadable"));
    let status: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["state"], "idle");
}
