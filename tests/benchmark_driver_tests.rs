//! End-to-end benchmark driver tests against hermetic workload scripts
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

mod utils;

use predicates::prelude::*;
use utils::{BenchTree, TestTree};

fn harness() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("sanharness")
}

#[test]
fn test_report_follows_the_wire_format() {
    let tree = BenchTree::deterministic();

    let assert = harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("10")
        .arg("--repetitions")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("==========binary sizes=========="))
        .stdout(predicate::str::contains("orig benchmark: "))
        .stdout(predicate::str::contains("new benchmark: "))
        .stdout(predicate::str::contains("run size: 10"))
        .stdout(predicate::str::contains("original mean: "))
        .stdout(predicate::str::contains("new mean: "))
        .stdout(predicate::str::contains("time overhead: "))
        .stdout(predicate::str::contains("peak mem usage original: "))
        .stdout(predicate::str::contains("new peak mem usage: "))
        .stdout(predicate::str::contains("space overhead: "));

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(
        stdout.starts_with("===========versioning===========\n"),
        "report must open with the versioning header:\n{stdout}"
    );
    let separators = stdout
        .lines()
        .filter(|line| *line == "================================")
        .count();
    // One closing the sizes section, one closing the single series block.
    assert_eq!(separators, 2, "unexpected separator count:\n{stdout}");
}

#[test]
fn test_series_blocks_come_in_catalog_size_order() {
    let tree = BenchTree::deterministic();

    let assert = harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("10,20")
        .arg("--repetitions")
        .arg("2")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let first = stdout.find("run size: 10").unwrap();
    let second = stdout.find("run size: 20").unwrap();
    assert!(first < second);
}

#[test]
fn test_test_binary_sizes_are_listed() {
    let tree = BenchTree::deterministic();
    let bins = TestTree::new();
    bins.add_binary("toy.safe", "echo instrumented build, deliberately longer");
    bins.add_binary("toy.safe.orig", "echo orig");

    harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("10")
        .arg("--repetitions")
        .arg("2")
        .arg("--test-bins")
        .arg(bins.path().join("bin"))
        .assert()
        .success()
        .stdout(predicate::str::contains("for file: toy.safe"))
        .stdout(predicate::str::contains("orig size: "))
        .stdout(predicate::str::contains("new size: "));
}

#[test]
fn test_baseline_divergence_aborts_the_run() {
    let tree = BenchTree::new("echo baseline", "echo instrumented");

    harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("10")
        .arg("--repetitions")
        .arg("2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("diverged from baseline"));
}

#[test]
fn test_nondeterministic_workload_aborts_the_run() {
    // Differs across the timed and sampled runs of the same binary.
    let tree = BenchTree::new("date +%s%N", "date +%s%N");

    harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("10")
        .arg("--repetitions")
        .arg("2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("different output across"));
}

#[test]
fn test_failing_workload_aborts_the_run() {
    let tree = BenchTree::new("exit 3", "exit 3");

    harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("10")
        .arg("--repetitions")
        .arg("2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exited with 3"));
}

#[test]
fn test_hung_workload_is_killed_at_the_deadline() {
    let tree = BenchTree::new("sleep 30", "sleep 30");

    harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("10")
        .arg("--repetitions")
        .arg("2")
        .arg("--timeout")
        .arg("1")
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure()
        .stderr(predicate::str::contains("killed"));
}

#[test]
fn test_single_repetition_is_rejected() {
    let tree = BenchTree::deterministic();

    harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("10")
        .arg("--repetitions")
        .arg("1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 2"));
}

#[test]
fn test_unsorted_sizes_are_rejected() {
    let tree = BenchTree::deterministic();

    harness()
        .arg("bench")
        .arg("--dir")
        .arg(tree.path())
        .arg("--sizes")
        .arg("100,10")
        .arg("--repetitions")
        .arg("2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ascending"));
}

#[test]
fn test_missing_benchmark_binary_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("bin")).unwrap();

    harness()
        .arg("bench")
        .arg("--dir")
        .arg(dir.path())
        .arg("--sizes")
        .arg("10")
        .arg("--repetitions")
        .arg("2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("benchmark"));
}
