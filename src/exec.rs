//! Child-process execution primitives
//!
//! Everything the harness learns about a child is externally visible state:
//! exit status, captured stdio, and the OS-reported resident set. Children
//! run one at a time; the only interleaving is the poll loop that races a
//! child to completion.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tracing::{debug, warn};

/// Interval between resident-memory samples while a child runs.
pub const MEM_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// Interval between exit polls when no memory sampling is requested.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} still running after {timeout:?}; killed")]
    Timeout { program: String, timeout: Duration },
    #[error("failed to wait on {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

/// Captured observable behavior of one child invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code; a signal death maps to the negated signal number.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn exited_normally(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a binary to completion, capturing stdio and wall-clock time.
///
/// The clock starts immediately before the spawn and stops when the exit is
/// observed, so the measurement includes process startup and teardown. Exit
/// observation is polled at 1ms granularity, which bounds the timing error.
pub fn run_timed(
    program: &Path,
    args: &[String],
    timeout: Duration,
) -> Result<(ExecutionResult, Duration), ExecError> {
    execute(program, args, timeout, EXIT_POLL_INTERVAL, |_| {})
}

/// Run a binary while sampling its resident set size every
/// [`MEM_SAMPLE_INTERVAL`], retaining the maximum observed value.
///
/// Best-effort estimate: an allocation shorter than the sampling interval
/// can be missed entirely, and memory the OS reclaims between samples is
/// never seen. Sufficient to compare instrumented and baseline builds of the
/// same workload; not a profiler.
pub fn run_sampled(
    program: &Path,
    args: &[String],
    timeout: Duration,
) -> Result<(ExecutionResult, u64), ExecError> {
    let mut peak: u64 = 0;
    let (result, _elapsed) = execute(program, args, timeout, MEM_SAMPLE_INTERVAL, |pid| {
        if let Some(rss) = resident_bytes(pid) {
            peak = peak.max(rss);
        }
    })?;
    debug!(program = %program.display(), peak_rss = peak, "memory-sampled run complete");
    Ok((result, peak))
}

/// Spawn, drain stdio on reader threads, and poll for exit under a deadline.
///
/// `on_poll` runs once per poll iteration (including one immediately after
/// the spawn) with the child's PID while the child may still be alive.
fn execute(
    program: &Path,
    args: &[String],
    timeout: Duration,
    poll: Duration,
    mut on_poll: impl FnMut(u32),
) -> Result<(ExecutionResult, Duration), ExecError> {
    let display = program.display().to_string();
    let start = Instant::now();
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ExecError::Spawn {
            program: display.clone(),
            source,
        })?;

    // Pipes must be drained concurrently with the wait loop: a child that
    // fills a pipe buffer while nobody reads it blocks forever.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = loop {
        on_poll(child.id());
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                kill_child(&child);
                let _ = child.wait();
                return Err(ExecError::Wait {
                    program: display,
                    source,
                });
            }
        }
        if start.elapsed() >= timeout {
            kill_child(&child);
            let _ = child.wait();
            return Err(ExecError::Timeout {
                program: display,
                timeout,
            });
        }
        thread::sleep(poll);
    };
    let elapsed = start.elapsed();

    let result = ExecutionResult {
        exit_code: exit_code_of(status),
        stdout: String::from_utf8_lossy(&join_drain(stdout)).into_owned(),
        stderr: String::from_utf8_lossy(&join_drain(stderr)).into_owned(),
    };
    Ok((result, elapsed))
}

fn drain(stream: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut stream = stream;
        let mut buf = Vec::new();
        // A killed child closes the pipe mid-read; whatever arrived still counts.
        let _ = stream.read_to_end(&mut buf);
        buf
    })
}

fn join_drain(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn kill_child(child: &Child) {
    let pid = Pid::from_raw(child.id() as i32);
    if let Err(err) = signal::kill(pid, Signal::SIGKILL) {
        warn!(%pid, %err, "failed to kill child");
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.code().unwrap_or_else(|| -status.signal().unwrap_or(0))
}

/// Resident set size of a live process, read from `/proc/<pid>/statm`.
///
/// Returns `None` once the process is gone or while it is mid-teardown.
fn resident_bytes(pid: u32) -> Option<u64> {
    let statm = fs::read_to_string(format!("/proc/{pid}/statm")).ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * page_size())
}

fn page_size() -> u64 {
    // SAFETY: sysconf reads a constant; no pointers involved.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        4096
    }
}
