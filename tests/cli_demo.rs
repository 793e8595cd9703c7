use assert_cmd::prelude::*;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

fn pilot(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("assess-pilot").expect("binary built");
    cmd.arg("--config").arg(config);
    for var in [
        "PILOT_USERNAME",
        "PILOT_PASSWORD",
        "PILOT_ASSESSMENT_KEY",
        "PILOT_DRIVER_URL",
        "PILOT_ORACLE_API_KEY",
        "PILOT_ORACLE_MODEL",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn extract_json(output: &str) -> Value {
    let start = output.find('{').expect("json start");
    let end = output.rfind('}').expect("json end");
    serde_json::from_str(&output[start..=end]).expect("valid json report")
}

#[test]
fn demo_run_prints_report() {
    let dir = tempfile::tempdir().unwrap();
    let assert = pilot(&dir.path().join("absent.yaml"))
        .args([
            "demo",
            "--direct-fails",
            "--direct-typing-fails",
            "--questions",
            "4",
            "--require-key",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let report = extract_json(&stdout);
    assert_eq!(report["final_state"], "done");
    assert_eq!(report["assessments_completed"], 1);
    assert_eq!(report["questions_answered"], 4);
    assert_eq!(report["questions_failed"], 0);
}

#[test]
fn demo_writes_metrics_file() {
    let dir = tempfile::tempdir().unwrap();
    let metrics = dir.path().join("out").join("metrics.prom");
    pilot(&dir.path().join("absent.yaml"))
        .args(["demo", "--questions", "2", "--metrics-out"])
        .arg(&metrics)
        .assert()
        .success();

    let text = std::fs::read_to_string(&metrics).unwrap();
    assert!(text.contains("pilot_action_path_total"));
    assert!(text.contains("pilot_questions_total"));
}

#[test]
fn demo_fails_after_consecutive_broken_questions() {
    let dir = tempfile::tempdir().unwrap();
    pilot(&dir.path().join("absent.yaml"))
        .args([
            "demo",
            "--fail-question",
            "1",
            "--fail-question",
            "2",
            "--fail-question",
            "3",
        ])
        .assert()
        .failure();
}

#[test]
fn config_show_redacts_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.yaml");
    std::fs::write(
        &path,
        "credentials:\n  username: student\n  password: hunter2\nassessment:\n  key: K-123\n",
    )
    .unwrap();

    let assert = pilot(&path).args(["config", "show"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("student"));
    assert!(!stdout.contains("hunter2"));
    assert!(!stdout.contains("K-123"));
}

#[test]
fn config_validate_rejects_zero_questions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.yaml");
    std::fs::write(&path, "assessment:\n  question_count: 0\n").unwrap();

    pilot(&path).args(["config", "validate"]).assert().failure();

    std::fs::write(&path, "assessment:\n  question_count: 5\n").unwrap();
    pilot(&path).args(["config", "validate"]).assert().success();
}

#[test]
fn dry_run_prints_plan_without_contacting_anything() {
    let dir = tempfile::tempdir().unwrap();
    let assert = pilot(&dir.path().join("absent.yaml"))
        .args(["run", "--dry-run", "--questions", "7"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("Dry run"));
    assert!(stdout.contains("7 per assessment"));
    assert!(stdout.contains("login.htm"));
}

#[test]
fn cache_commands_handle_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache_file = dir.path().join("cache.json");
    let config = dir.path().join("pilot.yaml");
    std::fs::write(&config, format!("cache:\n  path: {}\n", cache_file.display())).unwrap();

    let assert = pilot(&config).args(["cache", "show"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("0 cached action(s)"));

    let assert = pilot(&config)
        .args(["cache", "prune", "--ttl", "30m"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.contains("Pruned 0 entries"));

    pilot(&config).args(["cache", "clear"]).assert().success();
    assert!(!cache_file.exists());
}
