use std::fs;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn mead() -> Command {
    Command::new(env!("CARGO_BIN_EXE_mead"))
}

#[test]
fn fingerprint_prints_the_config_hash() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("model.json");
    fs::write(&config, r#"{"b": 14, "a": 12}"#).expect("write config");
    let output = mead()
        .args(["fingerprint", "--config"])
        .arg(&config)
        .output()
        .expect("run mead fingerprint");
    assert!(output.status.success(), "fingerprint failed");
    let body = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(body.trim(), "647aa7508f72ece3f8b9df986a206d95fd9a2caf");
}

#[test]
fn fingerprint_applies_overrides() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path().join("base.json");
    let tuned = dir.path().join("tuned.json");
    fs::write(&base, r#"{"train": {"epochs": 2}}"#).expect("write base");
    fs::write(&tuned, r#"{"train": {"epochs": 3.0}}"#).expect("write tuned");
    let run = |config: &std::path::Path, extra: &[&str]| {
        let output = mead()
            .args(["fingerprint", "--override-base", "train", "--config"])
            .arg(config)
            .arg("--")
            .args(extra)
            .output()
            .expect("run mead fingerprint");
        assert!(output.status.success(), "fingerprint failed");
        String::from_utf8(output.stdout).expect("utf8")
    };
    let overridden = run(&base, &["--train:epochs", "3"]);
    assert_ne!(run(&base, &[]), overridden);
    assert_eq!(run(&tuned, &[]), overridden);
}

#[test]
fn export_paths_reports_created_directories() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let output = mead()
        .args(["export-paths", "--output-dir"])
        .arg(&out)
        .args(["--model-version", "2", "--remote", "yes"])
        .output()
        .expect("run mead export-paths");
    assert!(output.status.success(), "export-paths failed");
    let report: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["params"]["is_remote"], Value::Bool(true));
    assert!(out.join("client").join("out").join("2").is_dir());
    assert!(out.join("server").join("out").join("2").is_dir());
}

#[test]
fn missing_dataset_fails() {
    let dir = tempdir().expect("tempdir");
    let index = dir.path().join("datasets.json");
    let entries = r#"[{"label": "SST2", "train_file": "t", "valid_file": "v", "test_file": "x"}]"#;
    fs::write(&index, entries).expect("write index");
    let status = mead()
        .args(["dataset", "--key", "wnut", "--index"])
        .arg(&index)
        .status()
        .expect("run mead dataset");
    assert!(!status.success());
}
