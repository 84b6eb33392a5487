//! Integration tests for the `shapediff` CLI binary.
//!
//! These run the real binary through `assert_cmd` and check the diff, query
//! and convert subcommands end to end: exit codes, report text, JSON output,
//! stdin input and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn shapediff() -> Command {
    Command::cargo_bin("shapediff").unwrap()
}

/// Run the command and parse its stdout as JSON.
fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).expect("stdout must be JSON")
}

// ─────────────────────────────────────────────────────────────────────────────
// diff
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn diff_identical_documents_succeeds() {
    shapediff()
        .args(["diff", &fixture("order_a.json"), &fixture("order_a.json")])
        .assert()
        .success()
        .stdout("DiffResult, AreSame=true\n");
}

#[test]
fn diff_reports_differences_and_exits_one() {
    shapediff()
        .args(["diff", &fixture("order_a.json"), &fixture("order_b.json")])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("DiffResult, AreSame=false\n"))
        .stdout(predicate::str::contains("$.total: values differ: '10' vs. '10.02'"))
        .stdout(predicate::str::contains("$.items: Elements [0..1] changed."))
        .stdout(predicate::str::contains("$.items[0].sku: values differ: 'x' vs. 'y'"));
}

#[test]
fn diff_with_settings_file() {
    shapediff()
        .args([
            "diff",
            &fixture("order_a.json"),
            &fixture("order_b.json"),
            "--settings",
            &fixture("settings.json"),
        ])
        .assert()
        .success()
        .stdout(
            "DiffResult, AreSame=true\n$.total: values differ: '10' vs. '10.02'\n",
        );
}

#[test]
fn diff_with_command_line_hints() {
    shapediff()
        .args([
            "diff",
            &fixture("order_a.json"),
            &fixture("order_b.json"),
            "--keyed-by",
            "$.items=sku",
            "--vary-by",
            "$.total=0.05",
        ])
        .assert()
        .success();
}

#[test]
fn diff_variance_too_small() {
    shapediff()
        .args([
            "diff",
            &fixture("order_a.json"),
            &fixture("order_b.json"),
            "--keyed-by",
            "$.items=sku",
            "--vary-by",
            "$.total=0.01",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("AreSame=false"));
}

#[test]
fn diff_subsequence_alignment() {
    shapediff()
        .args([
            "diff",
            &fixture("order_a.json"),
            &fixture("order_b.json"),
            "--subsequence",
            "$.items",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("$.items: Item [0] removed."))
        .stdout(predicate::str::contains("$.items: Item [1] added."));
}

#[test]
fn diff_json_report() {
    let report = stdout_json(shapediff().args([
        "diff",
        &fixture("order_a.json"),
        &fixture("order_b.json"),
        "--output",
        "json",
    ]));
    assert_eq!(report["are_same"], false);
    let first = &report["annotations"][0];
    assert_eq!(first["kind"], "differing_values");
    assert_eq!(first["path"], "$.total");
    assert_eq!(first["within_tolerance"], false);
}

#[test]
fn diff_xml_documents_with_settings() {
    shapediff()
        .args([
            "diff",
            &fixture("order_a.xml"),
            &fixture("order_b.xml"),
            "--settings",
            &fixture("settings.json"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("$.total: values differ: '10.00' vs. '10.02'"));
}

#[test]
fn diff_reads_one_side_from_stdin() {
    let input = std::fs::read_to_string(fixture("order_a.json")).unwrap();
    shapediff()
        .args(["diff", "-", &fixture("order_a.json")])
        .write_stdin(input)
        .assert()
        .success();
}

#[test]
fn diff_forced_format_overrides_detection() {
    shapediff()
        .args(["diff", "--format", "xml", "-", &fixture("order_a.xml")])
        .write_stdin(r#"<order id="A-1"><total>10.00</total><items><item><sku>x</sku><qty>2</qty></item><item><sku>y</sku><qty>1</qty></item></items></order>"#)
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// diff errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn diff_missing_file_exits_two() {
    shapediff()
        .args(["diff", "does-not-exist.json", &fixture("order_a.json")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn diff_malformed_document_exits_two() {
    shapediff()
        .args(["diff", "-", &fixture("order_a.json")])
        .write_stdin("{ not json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("JSON parse error"));
}

#[test]
fn diff_malformed_settings_path_exits_two() {
    shapediff()
        .args([
            "diff",
            &fixture("order_a.json"),
            &fixture("order_b.json"),
            "--settings",
            &fixture("bad_settings.json"),
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Path ended with open indexer"));
}

#[test]
fn diff_rejects_malformed_assignments() {
    shapediff()
        .args(["diff", "a.json", "b.json", "--keyed-by", "$.items"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH=VALUE"));

    shapediff()
        .args(["diff", "a.json", "b.json", "--vary-by", "$.total=lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a number"));
}

#[test]
fn diff_rejects_two_stdin_documents() {
    shapediff()
        .args(["diff", "-", "-"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Only one document"));
}

// ─────────────────────────────────────────────────────────────────────────────
// query
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn query_prints_paths_and_values() {
    shapediff()
        .args(["query", &fixture("order_a.json"), "$.items[*].sku"])
        .assert()
        .success()
        .stdout("$.items[0].sku = \"x\"\n$.items[1].sku = \"y\"\n");
}

#[test]
fn query_with_filter_expression() {
    shapediff()
        .args(["query", &fixture("order_a.json"), "$.items[?(@.qty > 1)]"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("$.items[0] = {"));
}

#[test]
fn query_json_output() {
    let rows = stdout_json(shapediff().args([
        "query",
        &fixture("order_a.xml"),
        "$..sku",
        "--output",
        "json",
    ]));
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[1]["path"], "$.items[1].sku");
    assert_eq!(rows[1]["value"], "y");
}

#[test]
fn query_without_matches_exits_one() {
    shapediff()
        .args(["query", &fixture("order_a.json"), "$.nothing"])
        .assert()
        .code(1)
        .stdout("");
}

#[test]
fn query_strict_reports_missing_steps() {
    shapediff()
        .args(["query", &fixture("order_a.json"), "$.nothing", "--strict"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Property 'nothing' does not exist on Object."));
}

#[test]
fn query_invalid_path_exits_two() {
    shapediff()
        .args(["query", &fixture("order_a.json"), "$.items[1:2:0]"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid path"));
}

// ─────────────────────────────────────────────────────────────────────────────
// convert
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn convert_xml_to_canonical_json() {
    let value = stdout_json(shapediff().args(["convert", &fixture("order_a.xml")]));
    assert_eq!(
        value,
        serde_json::json!({
            "total": "10.00",
            "items": [{"sku": "x", "qty": "2"}, {"sku": "y", "qty": "1"}],
            "id": "A-1"
        })
    );
}

#[test]
fn convert_compact_from_stdin() {
    shapediff()
        .args(["convert", "--compact", "-"])
        .write_stdin(r#"{ "b": [1, 2], "a": null }"#)
        .assert()
        .success()
        .stdout("{\"b\":[1,2],\"a\":null}\n");
}

#[test]
fn convert_to_file() {
    let out = std::env::temp_dir().join(format!("shapediff-convert-{}.json", std::process::id()));
    shapediff()
        .args(["convert", &fixture("order_a.json"), "-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout("");
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["items"][1]["sku"], "y");
    std::fs::remove_file(out).unwrap();
}

#[test]
fn no_subcommand_prints_usage() {
    shapediff()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
