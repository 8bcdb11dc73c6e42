//! Runs the `cliweave` demo binary as a subprocess.

use std::process::{Command, Output};
use tempfile::TempDir;

fn run(args: &[&str]) -> Output {
    // isolate from any user config file and CLIWEAVE_* settings on the machine
    let home = TempDir::new().unwrap();
    Command::new(env!("CARGO_BIN_EXE_cliweave"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("CLIWEAVE_LOG")
        .env_remove("CLIWEAVE_USAGE_SILENT")
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_default_greeting() {
    let output = run(&[]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "Hello, world!");
}

#[test]
fn test_loud_greeting_with_positional() {
    let output = run(&["--loud", "ada"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "HELLO, ADA!");
}

#[test]
fn test_version_flag() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("cliweave {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_help_lists_options_and_commands() {
    let output = run(&["-h"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Usage: cliweave"));
    assert!(text.contains("--loud"));
    assert!(text.contains("inspect"));
    assert!(text.contains("count"));
}

#[test]
fn test_inspect_prints_json() {
    let output = run(&["inspect", "--tag", "x", "file", "--", "--raw"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["command"], "inspect");
    assert_eq!(report["values"]["tag"], serde_json::json!(["x"]));
    assert_eq!(report["positionals"], serde_json::json!(["file"]));
    assert_eq!(report["rest"], serde_json::json!(["--raw"]));
}

#[test]
fn test_lazy_count_command() {
    let output = run(&["count", "a", "b", "c"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("counted 3 argument(s)"));
    assert_eq!(text.lines().last(), Some("3"));
}

#[test]
fn test_unknown_option_exits_with_error() {
    let output = run(&["--bogus"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}
