use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::{contains, starts_with};

fn nexus(log_dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("nexus"));
    cmd.env("NEXUS_LOG_DIR", log_dir.path())
        .env_remove("NEXUS_ENDPOINT")
        .env_remove("NEXUS_AGENT_ID")
        .env_remove("NEXUS_API_KEY")
        .env_remove("NEXUS_CONFIG");
    cmd
}

#[test]
fn test_cli_help() {
    let logs = tempfile::tempdir().unwrap();
    nexus(&logs)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("chat"))
        .stdout(contains("send"));
}

#[test]
fn test_cli_completions() {
    let logs = tempfile::tempdir().unwrap();
    nexus(&logs)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_nexus"));
}

#[test]
fn test_config_path_uses_flag() {
    let logs = tempfile::tempdir().unwrap();
    let path = logs.path().join("custom.toml");
    nexus(&logs)
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("custom.toml"));
}

#[test]
fn test_config_show_redacts_api_key() {
    let logs = tempfile::tempdir().unwrap();
    let path = logs.path().join("config.toml");
    std::fs::write(
        &path,
        "[default]\nagent_id = \"aura\"\n\n[auth]\napi_key = \"very-secret\"\n",
    )
    .unwrap();

    nexus(&logs)
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("aura"))
        .stdout(contains("very-secret").not());
}

#[test]
fn test_send_requires_message() {
    let logs = tempfile::tempdir().unwrap();
    nexus(&logs).arg("send").assert().failure();
}

#[test]
fn test_send_rejects_invalid_endpoint() {
    let logs = tempfile::tempdir().unwrap();
    nexus(&logs)
        .args(["send", "hi", "--endpoint", "ftp://example.com/stream"])
        .assert()
        .failure()
        .stderr(contains("Error:"));
}

#[test]
fn test_send_reports_unreachable_server() {
    let logs = tempfile::tempdir().unwrap();
    nexus(&logs)
        .args(["send", "hi", "--endpoint", "http://127.0.0.1:9/stream"])
        .assert()
        .failure()
        .stderr(contains("Error:"));
}
