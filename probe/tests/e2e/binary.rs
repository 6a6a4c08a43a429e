//! E2E tests: the built executable
//!
//! Each run gets an empty working directory and config home so no real
//! `.mcp-probe.toml` is picked up.

use std::path::Path;
use std::process::{Command, Output};

fn run_probe(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mcp-probe"))
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env("HOME", dir)
        .env_remove("MCP_SERVER_URL")
        .env_remove("MCP_TOKEN")
        .env_remove("MCP_HEALTH_URL")
        .env_remove("MCP_VERBOSE")
        .output()
        .expect("Failed to run mcp-probe")
}

#[test]
fn test_help_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_probe(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--test"));
    assert!(stdout.contains("--setup"));
}

#[test]
fn test_missing_settings_exit_two() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_probe(dir.path(), &["--test", "--plain"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("server url"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_url_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_probe(
        dir.path(),
        &["--test", "--plain", "--server-url", "not a url", "--token", "t"],
    );

    assert_eq!(output.status.code(), Some(2));
}

#[cfg(feature = "http")]
#[test]
fn test_unreachable_server_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("probe.toml");
    std::fs::write(
        &config,
        r#"
[server]
url = "http://127.0.0.1:9/mcp"
token = "t"

[connection]
connect_attempts = 1
connect_retry_delay_secs = 0
connect_init_timeout_secs = 5
"#,
    )
    .unwrap();

    let output = run_probe(
        dir.path(),
        &["--test", "--plain", "--config", config.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(1));
}
