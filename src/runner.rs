//! Differential test runner
//!
//! Drives every catalog entry through the instrumented binary, classifies
//! the observed behavior, and prints a colorized status line per test.
//! Individual failures never stop the pass; only a reference-compilation
//! failure does, because it invalidates the oracle for everything after it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::Catalog;
use crate::classify::{self, FailReason, Verdict};
use crate::exec;
use crate::toolchain;

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Test tree root containing `src/` and `bin/`.
    pub dir: PathBuf,
    /// External C compiler for reference builds.
    pub compiler: String,
    /// Deadline per child invocation.
    pub timeout: Duration,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
}

/// Run the audit pre-pass and the full differential pass.
pub fn run(catalog: &Catalog, config: &RunnerConfig) -> Result<RunSummary> {
    let warnings = audit(catalog, &config.dir.join("src"))?;
    let mut summary = RunSummary {
        warnings,
        ..RunSummary::default()
    };

    for case in catalog.cases() {
        let binary = config.dir.join("bin").join(&case.name);
        let (result, _elapsed) = exec::run_timed(&binary, &[], config.timeout)
            .with_context(|| format!("failed to run instrumented test {}", case.name))?;

        let verdict = classify::classify(case.expected, &result, || {
            baseline_stdout(config, &case.name)
        })?;

        match verdict {
            Verdict::Pass => {
                summary.passed += 1;
                println!("{GREEN}[PASSED]{RESET} {}", case.name);
            }
            Verdict::Fail(reason) => {
                summary.failed += 1;
                println!("{RED}[FAILED]{RESET} {}", case.name);
                println!("\t{}", reason.summary());
                if let FailReason::BehaviorDivergence { expected, actual } = &reason {
                    print_stdout_diff(expected, actual);
                }
            }
        }
    }

    info!(
        passed = summary.passed,
        failed = summary.failed,
        warnings = summary.warnings,
        "differential pass complete"
    );
    Ok(summary)
}

/// Coverage audit: warn about on-disk sources absent from the catalog.
fn audit(catalog: &Catalog, src_dir: &Path) -> Result<usize> {
    let unknown = catalog.unregistered_sources(src_dir)?;
    for name in &unknown {
        println!("{YELLOW}[WARNING]{RESET} {name} not in succeeding or failing tests");
    }
    Ok(unknown.len())
}

/// Build and run the reference binary, yielding its stdout as the oracle.
///
/// Always recompiles. Compilation failure propagates and aborts the pass.
fn baseline_stdout(config: &RunnerConfig, name: &str) -> Result<String> {
    let source = config.dir.join("src").join(format!("{name}.c"));
    let output = config.dir.join("bin").join(format!("{name}.orig"));
    toolchain::compile_reference(&config.compiler, &source, &output)
        .with_context(|| format!("reference compilation for test {name} failed; aborting run"))?;
    let (result, _elapsed) = exec::run_timed(&output, &[], config.timeout)
        .with_context(|| format!("failed to run reference binary for test {name}"))?;
    Ok(result.stdout)
}

/// Print both stdouts plus a per-line marker of where they diverge.
fn print_stdout_diff(expected: &str, actual: &str) {
    println!("\tExpected:\n{expected}\n\tBut got:\n{actual}");
    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    let common = expected_lines.len().min(actual_lines.len());
    for i in 0..common {
        if expected_lines[i] != actual_lines[i] {
            println!(
                "\tline {}: expected {:?}, got {:?}",
                i + 1,
                expected_lines[i],
                actual_lines[i]
            );
        }
    }
    for (i, line) in expected_lines.iter().enumerate().skip(common) {
        println!("\tline {}: expected {:?}, got nothing", i + 1, line);
    }
    for (i, line) in actual_lines.iter().enumerate().skip(common) {
        println!("\tline {}: unexpected {:?}", i + 1, line);
    }
}
