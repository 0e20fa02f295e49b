//! CLI tests for the dynaplug binary.

use assert_cmd::Command;
use dynaplug_testing::{fixture_path, RENAMED, TALLY};
use predicates::prelude::*;

fn dynaplug() -> Command {
    Command::cargo_bin("dynaplug").unwrap()
}

/// Test that the CLI binary exists and shows help.
#[test]
fn test_cli_help() {
    dynaplug()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("manifest"))
        .stdout(predicate::str::contains("filename"));
}

#[test]
fn test_cli_version() {
    dynaplug()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dynaplug"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_filename() {
    dynaplug()
        .args(["filename", "foo"])
        .assert()
        .success()
        .stdout("libfoo.so\n");
}

#[test]
fn test_check_nonexistent_library() {
    dynaplug()
        .args(["check", "/nonexistent/libmissing.so"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("Failed to load library at /nonexistent/libmissing.so"))
        .stderr(predicate::str::contains("1 of 1 plugin(s) failed"));
}

#[test]
fn test_check_clashing_symbols() {
    dynaplug()
        .args(["check", "/nonexistent/libx.so", "--factory", "same", "--destructor", "same"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("must be distinct"));
}

#[test]
fn test_check_fixture_library() {
    let path = fixture_path(TALLY).unwrap();

    dynaplug()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("create_plugin / delete_plugin"));
}

#[test]
fn test_check_renamed_factory() {
    let path = fixture_path(RENAMED).unwrap();

    dynaplug()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("'create_plugin'"));

    dynaplug()
        .arg("check")
        .arg(&path)
        .args(["--factory", "make_it"])
        .assert()
        .success();
}

#[test]
fn test_manifest_json_report() {
    let tally = fixture_path(TALLY).unwrap();
    let renamed = fixture_path(RENAMED).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("plugins.toml");
    std::fs::write(
        &manifest,
        format!(
            "[[plugin]]\nname = \"tally\"\npath = {:?}\n\n\
             [[plugin]]\nname = \"renamed\"\npath = {:?}\nfactory = \"make_it\"\n",
            tally.display().to_string(),
            renamed.display().to_string()
        ),
    )
    .unwrap();

    let output = dynaplug()
        .arg("manifest")
        .arg(&manifest)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["name"], "tally");
    assert_eq!(reports[0]["ok"], true);
    assert_eq!(reports[1]["factory"], "make_it");
    assert_eq!(reports[1]["ok"], true);
}

#[test]
fn test_manifest_with_failing_entry() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("plugins.toml");
    std::fs::write(&manifest, "[[plugin]]\nname = \"gone\"\npath = \"lib/libgone.so\"\n").unwrap();

    dynaplug()
        .arg("manifest")
        .arg(&manifest)
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL gone"))
        .stderr(predicate::str::contains("1 of 1 plugin(s) failed"));
}

#[test]
fn test_manifest_missing_file() {
    dynaplug()
        .args(["manifest", "/nonexistent/plugins.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load manifest"));
}

#[test]
fn test_manifest_misspelled_key() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("plugins.toml");
    std::fs::write(&manifest, "[[plugin]]\npath = \"libfoo.so\"\nfactroy = \"make_it\"\n").unwrap();

    dynaplug()
        .arg("manifest")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key 'factroy'"));
}
