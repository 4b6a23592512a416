//! CLI smoke tests for podup.
//!
//! These tests exercise argument parsing and the failure paths that do not
//! need a live container runtime.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the podup binary.
fn podup_cmd() -> Command {
  cargo_bin_cmd!("podup")
}

/// Create a temp project directory with a compose file.
fn temp_project(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("docker-compose.yml"), content).unwrap();
  temp
}

/// A path that exists but nothing listens on.
fn dead_socket(temp: &TempDir) -> std::path::PathBuf {
  let path = temp.path().join("runtime.sock");
  std::fs::write(&path, "").unwrap();
  path
}

const WEB_COMPOSE: &str = r#"
version: "3"
services:
  web:
    image: nginx:latest
    ports:
      - "8080:80"
"#;

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  podup_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  podup_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("podup"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["up", "down", "ps", "startup"] {
    podup_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn up_help_lists_flags() {
  podup_cmd()
    .args(["up", "--help"])
    .assert()
    .success()
    .stdout(predicate::str::contains("--detach"))
    .stdout(predicate::str::contains("--remove-orphans"));
}

// =============================================================================
// Manifest discovery
// =============================================================================

#[test]
fn up_without_compose_file_fails() {
  let temp = TempDir::new().unwrap();

  podup_cmd()
    .arg("up")
    .current_dir(temp.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("Supported filenames"))
    .stderr(predicate::str::contains("docker-compose.yml"));
}

#[test]
fn explicit_missing_file_fails() {
  let temp = TempDir::new().unwrap();

  podup_cmd()
    .args(["-f"])
    .arg(temp.path().join("nope.yml"))
    .arg("down")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn malformed_compose_file_fails() {
  let temp = temp_project("services: [not, a, map");

  podup_cmd()
    .arg("ps")
    .current_dir(temp.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn environment_entry_without_equals_fails() {
  let temp = temp_project(
    r#"
services:
  web:
    image: nginx
    environment:
      - BROKEN
"#,
  );

  podup_cmd()
    .arg("up")
    .current_dir(temp.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("BROKEN"));
}

// =============================================================================
// Runtime connectivity
// =============================================================================

#[test]
fn ps_with_unreachable_runtime_fails() {
  let temp = temp_project(WEB_COMPOSE);
  let socket = dead_socket(&temp);

  podup_cmd()
    .arg("ps")
    .current_dir(temp.path())
    .env("PODUP_HOST", format!("unix://{}", socket.display()))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to list containers"));
}

#[test]
fn up_with_unreachable_runtime_fails_before_reconciling() {
  let temp = temp_project(WEB_COMPOSE);
  let socket = dead_socket(&temp);

  podup_cmd()
    .args(["up", "-d"])
    .current_dir(temp.path())
    .env("PODUP_HOST", format!("unix://{}", socket.display()))
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to load container inventory"))
    .stdout(predicate::str::contains("creating").not());
}

#[test]
fn unsupported_endpoint_fails() {
  let temp = temp_project(WEB_COMPOSE);

  podup_cmd()
    .arg("ps")
    .current_dir(temp.path())
    .env("PODUP_HOST", "ssh://example.com")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to connect to container runtime"));
}
