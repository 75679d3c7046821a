//! CLI integration tests using assert_cmd
//!
//! These tests run the `admintools` binary against temp install directories.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Get a command instance for the admintools binary
fn admintools_cmd() -> Command {
    let mut cmd = Command::cargo_bin("admintools").expect("Failed to find admintools binary");
    cmd.env_remove("RUST_LOG")
        .env_remove("ADMINTOOLS_PERMANENT_DIR")
        .env_remove("ADMINTOOLS_INSTALL_ROOT")
        .env_remove("ADMINTOOLS_LOG_LEVEL");
    cmd
}

fn write_package(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).expect("Failed to create package"));
    for (name, content) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn test_help_command() {
    admintools_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upload packages onto a wiki installation"));
}

#[test]
fn test_version_command() {
    admintools_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("admintools"));
}

#[test]
fn test_upload_help() {
    admintools_cmd()
        .args(["upload", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rolling back on failure"));
}

#[test]
fn test_upload_saves_and_reports() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let install = temp.path().join("xwiki");
    let permanent = temp.path().join("permanent");
    fs::create_dir_all(&install).unwrap();
    fs::write(install.join("a.txt"), "old").unwrap();
    let package = temp.path().join("package.zip");
    write_package(&package, &[("a.txt", b"new"), ("b.txt", b"fresh")]);

    admintools_cmd()
        .arg("upload")
        .arg(&package)
        .arg("--install-root")
        .arg(&install)
        .arg("--permanent-dir")
        .arg(&permanent)
        .args(["--run-id", "cli-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SAVED"))
        .stdout(predicate::str::contains("adminTools.jobs.upload.batch.save.success"));

    assert_eq!(fs::read_to_string(install.join("a.txt")).unwrap(), "new");
    assert_eq!(fs::read_to_string(install.join("b.txt")).unwrap(), "fresh");
    assert_eq!(
        fs::read_to_string(permanent.join("adminTools/backup/cli-run/a.txt.bak")).unwrap(),
        "old"
    );
    assert!(permanent.join("adminTools/status/cli-run.json").exists());

    admintools_cmd()
        .args(["status", "cli-run"])
        .arg("--permanent-dir")
        .arg(&permanent)
        .assert()
        .success()
        .stdout(predicate::str::contains("Run cli-run"))
        .stdout(predicate::str::contains("SAVED"));
}

#[test]
fn test_failed_upload_exits_nonzero_and_restores() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let install = temp.path().join("xwiki");
    let permanent = temp.path().join("permanent");
    fs::create_dir_all(&install).unwrap();
    fs::write(install.join("a.txt"), "old").unwrap();
    fs::write(install.join("blocker"), "file").unwrap();
    let package = temp.path().join("package.zip");
    write_package(&package, &[("a.txt", b"new"), ("blocker/c.txt", b"c")]);

    admintools_cmd()
        .arg("upload")
        .arg(&package)
        .arg("--install-root")
        .arg(&install)
        .arg("--permanent-dir")
        .arg(&permanent)
        .args(["--run-id", "cli-fail", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"FAILED\""));

    assert_eq!(fs::read_to_string(install.join("a.txt")).unwrap(), "old");
}

#[test]
fn test_upload_missing_archive() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    admintools_cmd()
        .arg("upload")
        .arg(temp.path().join("missing.zip"))
        .arg("--install-root")
        .arg(temp.path())
        .arg("--permanent-dir")
        .arg(temp.path().join("permanent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open package"));
}

#[test]
fn test_pack_then_upload() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let source = temp.path().join("package");
    fs::create_dir_all(source.join("WEB-INF/lib")).unwrap();
    fs::write(source.join("WEB-INF/lib/foo-bar-1.3.jar"), "v1.3").unwrap();
    let install = temp.path().join("xwiki");
    fs::create_dir_all(install.join("WEB-INF/lib")).unwrap();
    fs::write(install.join("WEB-INF/lib/foo-bar-1.2.jar"), "v1.2").unwrap();
    let package = temp.path().join("package.zip");

    admintools_cmd()
        .arg("pack")
        .arg(&source)
        .arg(&package)
        .assert()
        .success()
        .stdout(predicate::str::contains("Packed 1 files"));

    admintools_cmd()
        .arg("upload")
        .arg(&package)
        .arg("--install-root")
        .arg(&install)
        .arg("--permanent-dir")
        .arg(temp.path().join("permanent"))
        .assert()
        .success();

    assert!(!install.join("WEB-INF/lib/foo-bar-1.2.jar").exists());
    assert_eq!(
        fs::read_to_string(install.join("WEB-INF/lib/foo-bar-1.3.jar")).unwrap(),
        "v1.3"
    );
}

#[test]
fn test_status_unknown_run() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    admintools_cmd()
        .args(["status", "does-not-exist"])
        .arg("--permanent-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No report for run does-not-exist"));
}

#[test]
fn test_status_rejects_run_id_with_path() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let permanent = temp.path().join("permanent");
    fs::create_dir_all(permanent.join("adminTools")).unwrap();
    fs::write(permanent.join("adminTools/secret.json"), "{}").unwrap();

    admintools_cmd()
        .args(["status", "../secret"])
        .arg("--permanent-dir")
        .arg(&permanent)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid run id"));
}
