//! End-to-end CLI tests for the dropbox-migrator binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE: &str = "Handle,Image Src,Variant Image\n\
    shoe,https://www.dropbox.com/s/abc/photo.jpg?dl=0,https://www.dropbox.com/s/abc/photo.jpg?dl=0\n\
    hat,https://cdn.shopify.com/hat.jpg,\n";

fn migrator() -> Command {
    let mut cmd = Command::cargo_bin("dropbox-migrator").unwrap();
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_REPO")
        .env_remove("RUST_LOG");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    migrator()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub Pages"))
        .stdout(predicate::str::contains("--dry-run"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    migrator()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dropbox-migrator"));
}

/// Test that a missing input argument is a usage error.
#[test]
fn test_binary_without_input_returns_error() {
    migrator()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    migrator()
        .args(["products.csv", "--invalid-flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that a live run without a token fails before touching anything.
#[test]
fn test_binary_without_token_fails() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("products.csv");
    fs::write(&input, SAMPLE).unwrap();

    migrator()
        .arg(&input)
        .args(["--repo", "acme/imgs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing GitHub token"));

    assert!(!temp.path().join("products_with_github_urls.csv").exists());
}

/// Test that a malformed repository is rejected.
#[test]
fn test_binary_invalid_repo_fails() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("products.csv");
    fs::write(&input, SAMPLE).unwrap();

    migrator()
        .arg(&input)
        .args(["--token", "t0ken", "--repo", "just-a-name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected owner/name"));
}

/// Test that --dry-run lists candidates without credentials or output files.
#[test]
fn test_binary_dry_run_lists_candidates() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("products.csv");
    fs::write(&input, SAMPLE).unwrap();

    migrator()
        .current_dir(temp.path())
        .arg(&input)
        .args(["--dry-run", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 unique Dropbox image(s)"))
        .stdout(predicate::str::contains(
            "https://www.dropbox.com/s/abc/photo.jpg?dl=1 -> images/photo.jpg",
        ))
        .stdout(predicate::str::contains("hat.jpg").not());

    assert!(!temp.path().join("products_with_github_urls.csv").exists());
    assert!(!temp.path().join("dropbox_to_github_mappings.csv").exists());
}

/// Test that a missing input file is reported.
#[test]
fn test_binary_dry_run_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    migrator()
        .arg(temp.path().join("absent.csv"))
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.csv"));
}

/// Test that --source-host changes which links a dry run picks up.
#[test]
fn test_binary_dry_run_honors_source_host() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("products.csv");
    fs::write(
        &input,
        "Handle,Image Src\n\
         shoe,http://127.0.0.1:8080/s/abc/shoe.jpg?dl=0\n\
         hat,https://www.dropbox.com/s/abc/hat.jpg?dl=0\n",
    )
    .unwrap();

    migrator()
        .current_dir(temp.path())
        .arg(&input)
        .args(["--dry-run", "-q", "--source-host", "127.0.0.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 unique Dropbox image(s)"))
        .stdout(predicate::str::contains(
            "http://127.0.0.1:8080/s/abc/shoe.jpg?dl=1 -> images/shoe.jpg",
        ))
        .stdout(predicate::str::contains("hat.jpg").not());
}

/// Test that a dry run shows distinct paths for images sharing a file name.
#[test]
fn test_binary_dry_run_separates_shared_file_names() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("products.csv");
    fs::write(
        &input,
        "Handle,Image Src\n\
         shoe,https://www.dropbox.com/s/aaa/photo.jpg?dl=0\n\
         boot,https://www.dropbox.com/s/bbb/photo.jpg?dl=0\n",
    )
    .unwrap();

    migrator()
        .arg(&input)
        .args(["--dry-run", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 unique Dropbox image(s)"))
        .stdout(predicate::str::contains("-> images/photo.jpg").not());
}
