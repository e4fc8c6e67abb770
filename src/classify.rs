//! Outcome classification for differential test runs

use anyhow::Result;

use crate::catalog::ExpectedOutcome;
use crate::exec::ExecutionResult;

/// Diagnostic marker the instrumentation prints on a detected violation.
///
/// A literal substring match is the contract with the sanitizer runtime; it
/// is deliberately kept in one place.
pub const FAULT_MARKER: &str = "ILLEGAL ACCESS AT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(FailReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// Exit status contradicts the expected category.
    MisclassifiedExit { exit_code: i32 },
    /// Exit status matched, but instrumentation altered observable output.
    BehaviorDivergence { expected: String, actual: String },
    /// A fault was expected but the diagnostic never appeared on stderr.
    MissingDiagnostic,
}

impl FailReason {
    /// One-line human-readable cause.
    pub fn summary(&self) -> &'static str {
        match self {
            FailReason::MisclassifiedExit { .. } => {
                "Either the program crashed when it should not have, or vice versa."
            }
            FailReason::BehaviorDivergence { .. } => {
                "Exit code is correct, but program behaviour has been altered!"
            }
            FailReason::MissingDiagnostic => {
                "Expected stderr to contain the sanitizer error message, but this did not happen."
            }
        }
    }
}

/// Classify one instrumented run against its expected outcome.
///
/// `baseline_stdout` is the oracle for safe tests: it is invoked only when
/// the exit status already matched, and typically recompiles and runs the
/// reference build. Its error (compilation failure) aborts the whole pass,
/// which is why this returns `Result<Verdict>` rather than a plain verdict.
pub fn classify<F>(
    expected: ExpectedOutcome,
    result: &ExecutionResult,
    baseline_stdout: F,
) -> Result<Verdict>
where
    F: FnOnce() -> Result<String>,
{
    let exited_normally = result.exited_normally();
    let expected_safe = expected == ExpectedOutcome::Safe;

    if exited_normally ^ expected_safe {
        return Ok(Verdict::Fail(FailReason::MisclassifiedExit {
            exit_code: result.exit_code,
        }));
    }

    if expected_safe {
        let expected_out = baseline_stdout()?;
        if expected_out != result.stdout {
            return Ok(Verdict::Fail(FailReason::BehaviorDivergence {
                expected: expected_out,
                actual: result.stdout.clone(),
            }));
        }
        return Ok(Verdict::Pass);
    }

    if result.stderr.contains(FAULT_MARKER) {
        Ok(Verdict::Pass)
    } else {
        Ok(Verdict::Fail(FailReason::MissingDiagnostic))
    }
}
