//! External toolchain interface: reference builds, version probes, binary sizes

use std::fs;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to invoke compiler {compiler}: {source}")]
    CompilerUnavailable {
        compiler: String,
        source: std::io::Error,
    },
    #[error("compilation of {source_file} failed:\n{stderr}")]
    CompilationFailed { source_file: String, stderr: String },
}

/// Compile a reference (uninstrumented) binary with the external C compiler.
///
/// Invoked on every classification of a safe test, with no caching. The
/// recompile is cheap relative to a test run and guarantees the oracle can
/// never go stale behind an edited source.
pub fn compile_reference(
    compiler: &str,
    source: &Path,
    output: &Path,
) -> Result<(), ToolchainError> {
    debug!(%compiler, source = %source.display(), "building reference binary");
    let result = Command::new(compiler)
        .arg(source)
        .arg("-o")
        .arg(output)
        .output()
        .map_err(|source| ToolchainError::CompilerUnavailable {
            compiler: compiler.to_string(),
            source,
        })?;
    if !result.status.success() {
        return Err(ToolchainError::CompilationFailed {
            source_file: source.display().to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        });
    }
    Ok(())
}

/// First stdout of `<program> --version`, for the report's versioning section.
///
/// Version probes are reproducibility metadata, not a measurement basis, so
/// a missing tool degrades to a placeholder instead of aborting.
pub fn version_probe(program: &str) -> String {
    match Command::new(program).arg("--version").output() {
        Ok(out) if out.status.success() => {
            String::from_utf8_lossy(&out.stdout).trim_end().to_string()
        }
        Ok(out) => {
            warn!(%program, code = ?out.status.code(), "version probe exited nonzero");
            format!("{program}: version unavailable")
        }
        Err(err) => {
            warn!(%program, %err, "version probe failed");
            format!("{program}: not found")
        }
    }
}

/// On-disk size of a binary in bytes.
pub fn binary_size(path: &Path) -> std::io::Result<u64> {
    fs::metadata(path).map(|meta| meta.len())
}
