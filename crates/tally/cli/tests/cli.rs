//! Integration tests for the `tally` binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn corpus_fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../corpus/fixtures")
}

/// `tally` with a config path that does not exist, so a user's own
/// configuration never leaks into a test.
fn tally(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("TALLY_CONFIG", dir.path().join("absent.toml"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn corpus_verifies() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .arg("verify")
        .arg(corpus_fixtures())
        .assert()
        .success()
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("9 fixture(s) passed"));
}

#[test]
fn stripped_expectation_fails() {
    let dir = TempDir::new().unwrap();
    let source = fs::read_to_string(corpus_fixtures().join("history.vy")).unwrap();
    let stripped = source.replace(
        "#:: ExpectedOutput(invariant.violated:assertion.false, INC)\n",
        "",
    );
    assert_ne!(source, stripped);
    let path = dir.path().join("history.vy");
    fs::write(&path, stripped).unwrap();

    tally(&dir)
        .arg("verify")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("failed"))
        .stderr(predicate::str::contains("1 of 1 fixture(s) failed"));
}

#[test]
fn verbose_run_explains_failures() {
    let dir = TempDir::new().unwrap();
    let source = fs::read_to_string(corpus_fixtures().join("token.vy")).unwrap();
    let path = dir.path().join("token.vy");
    fs::write(&path, source.replace("#:: ExpectedOutput(create.failed:not.a.creator)\n", "")).unwrap();

    tally(&dir)
        .args(["--verbose", "verify"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("unexpected"))
        .stdout(predicate::str::contains("create.failed:not.a.creator"));
}

#[test]
fn fixture_without_model_fails_unless_ignored() {
    let dir = TempDir::new().unwrap();
    let orphan = dir.path().join("orphan.vy");
    fs::write(&orphan, "@public\ndef f():\n    pass\n").unwrap();
    tally(&dir)
        .arg("verify")
        .arg(&orphan)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no model"));

    fs::write(&orphan, "#:: IgnoreFile(/tally/issue/1/)\n@public\ndef f():\n    pass\n").unwrap();
    tally(&dir)
        .arg("verify")
        .arg(&orphan)
        .assert()
        .success()
        .stdout(predicate::str::contains("ignored"));
}

#[test]
fn json_output_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let output = tally(&dir)
        .args(["--output", "json", "verify"])
        .arg(corpus_fixtures().join("bank.vy"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["fixture"], "bank");
    assert_eq!(rows[0]["status"], "passed");
    assert_eq!(rows[0]["matched"], 1);
}

#[test]
fn invalid_bounds_are_rejected() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .args(["verify", "--addresses", "0"])
        .arg(corpus_fixtures())
        .assert()
        .failure()
        .stderr(predicate::str::contains("addresses"));
}

#[test]
fn directives_are_listed_with_anchors() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .arg("directives")
        .arg(corpus_fixtures().join("history.vy"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ExpectedOutput(invariant.violated:assertion.false, INC)",
        ))
        .stdout(predicate::str::contains("Label(INC)"));
}

#[test]
fn models_are_listed() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("non_injective_foreach"))
        .stdout(predicate::str::contains("wtoken"));
}

#[test]
fn config_file_sets_bounds() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tally.toml");
    fs::write(&path, "[bounds]\nmax_depth = 3\n").unwrap();

    let output = tally(&dir)
        .args(["--output", "json", "--config"])
        .arg(&path)
        .arg("config")
        .output()
        .unwrap();
    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["bounds"]["max_depth"], 3);
    assert_eq!(config["bounds"]["addresses"], 3);
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tally.toml");
    fs::write(&path, "[bounds\n").unwrap();
    tally(&dir)
        .arg("--config")
        .arg(&path)
        .arg("models")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
