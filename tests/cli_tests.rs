//! End-to-end checks of the urlfeatures binary.
//!
//! Every run happens in a temp dir so the binary falls back to the built-in
//! configuration and never touches the repository's `config/`.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn urlfeatures() -> assert_cmd::Command {
    cargo_bin_cmd!("urlfeatures")
}

// Port 1 on loopback refuses connections, and the www. retry host does not resolve
const DEAD_URL: &str = "http://127.0.0.1:1/login";

#[test]
fn test_missing_url_source_fails() {
    let tmp = TempDir::new().unwrap();
    urlfeatures()
        .current_dir(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("URL source"));
}

#[test]
fn test_zero_threads_rejected() {
    let tmp = TempDir::new().unwrap();
    urlfeatures()
        .current_dir(tmp.path())
        .args(["-u", DEAD_URL, "-t", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("positive integer"));
}

#[test]
fn test_non_numeric_threads_rejected_by_parser() {
    let tmp = TempDir::new().unwrap();
    urlfeatures()
        .current_dir(tmp.path())
        .args(["-u", DEAD_URL, "-t", "many"])
        .assert()
        .failure();
}

#[test]
fn test_unknown_format_rejected() {
    let tmp = TempDir::new().unwrap();
    urlfeatures()
        .current_dir(tmp.path())
        .args(["-u", DEAD_URL, "--format", "xml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("csv"));
}

#[test]
fn test_missing_url_file() {
    let tmp = TempDir::new().unwrap();
    urlfeatures()
        .current_dir(tmp.path())
        .args(["-f", "missing.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_missing_explicit_config() {
    let tmp = TempDir::new().unwrap();
    urlfeatures()
        .current_dir(tmp.path())
        .args(["-u", DEAD_URL, "--config", "nope.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--init"));
}

#[test]
fn test_init_writes_default_config() {
    let tmp = TempDir::new().unwrap();
    urlfeatures()
        .current_dir(tmp.path())
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created default configuration file"));

    let written = fs::read_to_string(tmp.path().join("config").join("urlfeatures.toml")).unwrap();
    assert!(written.contains("[probes]"));
    assert!(written.contains("workers"));
}

#[test]
fn test_help_lists_options() {
    urlfeatures()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--file")
                .and(predicate::str::contains("--url"))
                .and(predicate::str::contains("--output"))
                .and(predicate::str::contains("--threads")),
        );
}

#[test]
fn test_inaccessible_url_outputs_header_only() {
    let tmp = TempDir::new().unwrap();
    let output = urlfeatures()
        .current_dir(tmp.path())
        .args(["-u", DEAD_URL])
        .timeout(Duration::from_secs(60))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("url,length_url,length_hostname"));
    assert!(lines[0].ends_with("google_index,page_rank"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&format!("URL {} not accessible", DEAD_URL)));
    assert!(stderr.contains("Time:"));
}

#[test]
fn test_output_file_from_url_list() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("urls.txt"), format!("{}\n\n", DEAD_URL)).unwrap();

    urlfeatures()
        .current_dir(tmp.path())
        .args(["-f", "urls.txt", "-o", "out.csv", "--no-external-links"])
        .timeout(Duration::from_secs(60))
        .assert()
        .success()
        .stdout(predicate::str::contains("Results written in out.csv"));

    let written = fs::read_to_string(tmp.path().join("out.csv")).unwrap();
    assert_eq!(written.lines().count(), 1);
    assert!(written.contains("ratio_intHyperlinks"));
}

#[test]
fn test_json_output_is_empty_array() {
    let tmp = TempDir::new().unwrap();
    let output = urlfeatures()
        .current_dir(tmp.path())
        .args(["-u", DEAD_URL, "--format", "json"])
        .timeout(Duration::from_secs(60))
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
}
