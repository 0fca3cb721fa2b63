use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn config_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(".kube-doctor.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_filters_list_shows_core_and_additional() {
    let tmp = TempDir::new().unwrap();
    let path = config_file(&tmp, "");

    Command::cargo_bin("kube-doctor")
        .unwrap()
        .env("NO_COLOR", "1")
        .args(["--config", path.to_str().unwrap(), "filters", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active:"))
        .stdout(predicate::str::contains("Pod"))
        .stdout(predicate::str::contains("Unused:"))
        .stdout(predicate::str::contains("Ingress"));
}

#[test]
fn test_filters_add_persists_to_config_file() {
    let tmp = TempDir::new().unwrap();
    let path = config_file(&tmp, "[analysis]\nactive_filters = [\"Pod\"]\n");

    Command::cargo_bin("kube-doctor")
        .unwrap()
        .args(["--config", path.to_str().unwrap(), "filters", "add", "Ingress"])
        .assert()
        .success();

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("Ingress"));
    assert!(saved.contains("Pod"));
}

#[test]
fn test_unknown_filter_add_fails() {
    let tmp = TempDir::new().unwrap();
    let path = config_file(&tmp, "");

    Command::cargo_bin("kube-doctor")
        .unwrap()
        .args(["--config", path.to_str().unwrap(), "filters", "add", "bogus"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Filter bogus does not exist"));
}

#[test]
fn test_explain_without_provider_fails_before_cluster_access() {
    let tmp = TempDir::new().unwrap();
    let path = config_file(&tmp, "");

    Command::cargo_bin("kube-doctor")
        .unwrap()
        .args(["--config", path.to_str().unwrap(), "analyze", "--explain"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: AI provider not specified in configuration",
        ));
}

#[test]
fn test_malformed_config_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let path = config_file(&tmp, "[analysis\n");

    Command::cargo_bin("kube-doctor")
        .unwrap()
        .args(["--config", path.to_str().unwrap(), "filters", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration file"));
}

#[test]
fn test_filters_add_keeps_local_config_local() {
    let project = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let local = config_file(&project, "[ai]\ndefault_provider = \"openai\"\n");

    Command::cargo_bin("kube-doctor")
        .unwrap()
        .current_dir(project.path())
        .env("HOME", home.path())
        .args(["filters", "add", "Ingress"])
        .assert()
        .success();

    let saved = fs::read_to_string(&local).unwrap();
    assert!(saved.contains("Ingress"));
    assert!(saved.contains("openai"));
    assert!(!home.path().join(".kube-doctor.toml").exists());
}
