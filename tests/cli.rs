// ==============================================================================
// CLI Integration Tests: Exercise the `json2avro` Binary via Subprocess
// ==============================================================================
//
// These run the compiled binary with `assert_cmd`, checking exit codes,
// stdout/stderr content, and output files. Files are written under `tmp/`
// in the crate root, one directory per test.

mod common;

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use common::{fixture, read_fixture};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[allow(deprecated)] // cargo_bin() warns about custom build-dir; acceptable here
fn json2avro() -> Command {
    Command::cargo_bin("json2avro").expect("json2avro binary should be built by cargo")
}

fn fresh_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tmp").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create test output directory");
    dir
}

fn parse_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each output line should be JSON"))
        .collect()
}

// ==============================================================================
// `schema` Subcommand
// ==============================================================================

#[test]
fn schema_to_stdout_matches_golden() {
    let output = json2avro()
        .arg("schema")
        .arg(fixture("people.json"))
        .output()
        .expect("run json2avro schema");
    assert!(output.status.success(), "json2avro schema should exit 0");

    let actual: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let expected: Value = serde_json::from_str(&read_fixture("people.avsc")).unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn schema_to_file_with_table_and_namespace() {
    let dir = fresh_dir("cli-schema-to-file");
    let out = dir.join("people.avsc");
    json2avro()
        .args(["schema", "--table", "person", "--namespace", "org.example"])
        .arg(fixture("people.json"))
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["name"], json!("person"));
    assert_eq!(written["namespace"], json!("org.example"));
    // Nested named types inherit the namespace, so it is not repeated.
    assert_eq!(written["fields"][2]["type"].get("namespace"), None);
}

#[test]
fn broken_schema_reports_column_and_hint() {
    json2avro()
        .arg("schema")
        .arg(fixture("broken.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown type `lng`"))
        .stderr(predicate::str::contains("did you mean `long`?"));
}

#[test]
fn missing_schema_file() {
    json2avro()
        .args(["schema", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent.json"));
}

// ==============================================================================
// `convert` Subcommand
// ==============================================================================

#[test]
fn convert_file_to_stdout() {
    let output = json2avro()
        .arg("convert")
        .arg(fixture("people.json"))
        .arg(fixture("people.ndjson"))
        .output()
        .expect("run json2avro convert");
    assert!(output.status.success(), "json2avro convert should exit 0");
    assert_eq!(
        parse_lines(&output.stdout),
        vec![
            json!({"id": 1, "name": "Ada", "status": "ACTIVE", "tags": ["math"],
                   "address": {"city": "London", "zip": "NW1 6"}}),
            json!({"id": 2, "name": "Grace", "status": "INACTIVE", "tags": null, "address": null}),
        ]
    );
}

#[test]
fn convert_stdin_to_file() {
    let dir = fresh_dir("cli-convert-stdin");
    let out = dir.join("people.ndjson");
    json2avro()
        .arg("convert")
        .arg(fixture("people.json"))
        .arg("-")
        .arg(&out)
        .write_stdin("{\"id\": 5, \"status\": \"ACTIVE\"}\n")
        .assert()
        .success();

    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(
        written,
        "{\"id\":5,\"name\":null,\"status\":\"ACTIVE\",\"tags\":null,\"address\":null}\n"
    );
}

#[test]
fn convert_stops_at_first_bad_record() {
    json2avro()
        .arg("convert")
        .arg(fixture("people.json"))
        .arg(fixture("people_bad.ndjson"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"id\":1"))
        .stdout(predicate::str::contains("\"id\":3").not())
        .stderr(predicate::str::contains("record on line 2"))
        .stderr(predicate::str::contains("did you mean `ACTIVE`?"));
}

#[test]
fn convert_without_unpacking_passes_records_through() {
    let output = json2avro()
        .args(["convert", "--no-unpack"])
        .arg(fixture("people.json"))
        .write_stdin("{\"status\": \"anything\", \"extra\": 1}\n")
        .output()
        .expect("run json2avro convert --no-unpack");
    assert!(output.status.success());
    assert_eq!(
        parse_lines(&output.stdout),
        vec![json!({"status": "anything", "extra": 1})]
    );
}

// ==============================================================================
// Usage
// ==============================================================================

#[test]
fn help_prints_usage() {
    json2avro()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn unknown_subcommand_shows_usage() {
    json2avro()
        .arg("bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"))
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn no_unpack_is_rejected_for_schema() {
    json2avro()
        .args(["schema", "--no-unpack"])
        .arg(fixture("people.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--no-unpack"));
}
