//! Integration tests for the `tally` binary.
//!
//! Every test points `--config` at a temporary file so no user configuration
//! or network summarizer is involved.

#![allow(deprecated)] // Command::cargo_bin

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RECEIPT: &str = "\
FRESH MART
Invoice No: 4821
3 x Widget 10.00
Gadget $5
Total 35.00
";

/// Write a config file that keeps the summarizer offline.
fn offline_config(dir: &Path, summary_enabled: bool) -> PathBuf {
    let path = dir.join("config.json");
    let config = serde_json::json!({
        "summary": {
            "enabled": summary_enabled,
            "endpoint": "http://127.0.0.1:9",
            "timeout_secs": 2
        }
    });
    fs::write(&path, config.to_string()).unwrap();
    path
}

fn tally(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env_remove("GEMINI_API_KEY").arg("--config").arg(config);
    cmd
}

#[test]
fn test_process_text_to_csv() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), false);
    let input = dir.path().join("receipt.txt");
    fs::write(&input, RECEIPT).unwrap();

    tally(&config)
        .args(["process", "--no-summary", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(
            "Product Name,Quantity,Unit Price,Net Amount\n\
             Widget,3,10.00,30.00\n\
             Gadget,1,5.00,5.00\n\
             Grand Total,,,35.00\n",
        );
}

#[test]
fn test_process_text_to_json() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), false);
    let input = dir.path().join("receipt.txt");
    fs::write(&input, RECEIPT).unwrap();

    let output = tally(&config)
        .args(["process", "-f", "json"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"], "Summary disabled.");
    assert_eq!(json["source"], "plain_text");
    assert_eq!(json["stats"]["accepted"], 2);

    let rows = json["Line_Items"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["Product Name"], "Widget");
    assert_eq!(rows[0]["Quantity"], 3);
    assert_eq!(rows[0]["Unit Price"], 10.0);
    assert_eq!(rows[0]["Net Amount"], 30.0);
    assert_eq!(rows[2]["Product Name"], "Grand Total");
    assert_eq!(rows[2]["Net Amount"], 35.0);
}

#[test]
fn test_process_empty_file_yields_placeholder_row() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), false);
    let input = dir.path().join("blank.txt");
    fs::write(&input, "").unwrap();

    tally(&config)
        .args(["process", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("No items detected,0,0.00,0.00"))
        .stdout(predicate::str::contains("Grand Total,,,0.00"));
}

#[test]
fn test_process_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), false);
    let input = dir.path().join("receipt.txt");
    let output = dir.path().join("items.txt");
    fs::write(&input, RECEIPT).unwrap();

    tally(&config)
        .args(["process", "-f", "text", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("Summary:\n  Summary disabled.\n"));
    assert!(text.contains("Line_Items\n"));
    assert!(text.ends_with("Grand Total: 35.00\n"));
}

#[test]
fn test_process_without_api_key_still_extracts() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), true);
    let input = dir.path().join("receipt.txt");
    fs::write(&input, RECEIPT).unwrap();

    let output = tally(&config)
        .args(["process", "-f", "json"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"], "Summary unavailable: API key not configured.");
    assert_eq!(json["Line_Items"].as_array().unwrap().len(), 3);
}

#[test]
fn test_process_unsupported_input_fails() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), false);
    let input = dir.path().join("invoice.docx");
    fs::write(&input, "Widget 10.00").unwrap();

    tally(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file format"));
}

#[test]
fn test_process_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), false);

    tally(&config)
        .arg("process")
        .arg(dir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), false);
    let inputs = dir.path().join("inputs");
    let out = dir.path().join("out");
    fs::create_dir_all(&inputs).unwrap();
    fs::write(inputs.join("a.txt"), RECEIPT).unwrap();
    fs::write(inputs.join("b.txt"), "").unwrap();
    fs::write(inputs.join("notes.md"), "Widget 10.00").unwrap();

    let pattern = format!("{}/*", inputs.display());
    tally(&config)
        .args(["batch", "-f", "csv", "--summary", "-j", "2", "-o"])
        .arg(&out)
        .arg(&pattern)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    let a = fs::read_to_string(out.join("a.csv")).unwrap();
    assert!(a.ends_with("Grand Total,,,35.00\n"));
    let b = fs::read_to_string(out.join("b.csv")).unwrap();
    assert!(b.contains("No items detected"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(
        lines[0],
        "filename,status,source,items,grand_total,processing_time_ms,error"
    );
    assert!(lines[1].starts_with("a.txt,success,plain_text,2,35.00,"));
    assert!(lines[2].starts_with("b.txt,success,plain_text,0,0.00,"));
}

#[test]
fn test_batch_no_matches_fails() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path(), false);
    let pattern = format!("{}/*.pdf", dir.path().display());

    tally(&config)
        .args(["batch"])
        .arg(&pattern)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_config_init_and_get() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tally").join("config.json");

    Command::cargo_bin("tally")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    Command::cargo_bin("tally")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "summary.model", "gemini-test"])
        .assert()
        .success();

    Command::cargo_bin("tally")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "summary.model"])
        .assert()
        .success()
        .stdout("\"gemini-test\"\n");

    Command::cargo_bin("tally")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
