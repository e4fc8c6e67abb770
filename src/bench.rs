//! Benchmark driver: dual instrumented/baseline runs over sized workloads
//!
//! Every measurement is anchored to a correctness assertion: a benchmarked
//! binary whose output disagrees with the baseline (or with its own second
//! run) invalidates its numbers, so any divergence aborts the whole run
//! instead of recording deceptive statistics.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::exec::{self, ExecutionResult};
use crate::report::{BenchmarkSeries, Report, SizePair};
use crate::stats;
use crate::toolchain;

/// Largest seed handed to a workload, inclusive (2^31 - 1).
const SEED_MAX: u32 = 2_147_483_647;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(
        "benchmark workload {binary} exited with {exit_code} (seed {seed}, size {size}):\n{stderr}"
    )]
    WorkloadFailed {
        binary: String,
        exit_code: i32,
        seed: u32,
        size: usize,
        stderr: String,
    },
    #[error(
        "{binary} produced different output across its timed and sampled runs \
         (seed {seed}, size {size}); its measurements cannot be trusted"
    )]
    RunDivergence {
        binary: String,
        seed: u32,
        size: usize,
    },
    #[error(
        "instrumented output diverged from baseline (seed {seed}, size {size}); \
         overhead numbers would be deceptive"
    )]
    BaselineDivergence { seed: u32, size: usize },
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Benchmark tree root containing `bin/benchmark` and `bin/benchmark.orig`.
    pub dir: PathBuf,
    /// Directory holding instrumented test binaries and their `.orig` pairs,
    /// scanned for the binary-size section. `None` skips that scan.
    pub test_bins: Option<PathBuf>,
    /// Workload sizes, ascending.
    pub sizes: Vec<usize>,
    /// Trials per size; at least 2 so a standard deviation exists.
    pub repetitions: usize,
    /// Deadline per child invocation.
    pub timeout: Duration,
    /// Reference compiler named in the versioning section.
    pub compiler: String,
}

/// Measurements of one (seed, size) trial across both builds.
#[derive(Debug, Clone, Copy)]
struct Trial {
    time_orig: f64,
    time_new: f64,
    mem_orig: u64,
    mem_new: u64,
}

#[derive(Debug)]
struct SingleRun {
    stdout: String,
    /// Wall-clock seconds of the timed (unsampled) run.
    elapsed: f64,
    peak_rss: u64,
}

/// Run the full benchmark: versioning, binary sizes, one series per size.
pub fn run(config: &BenchConfig) -> Result<Report> {
    let orig_bin = config.dir.join("bin").join("benchmark.orig");
    let new_bin = config.dir.join("bin").join("benchmark");

    let versioning = vec![
        (
            "Harness version".to_string(),
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        ),
        ("LLVM version".to_string(), toolchain::version_probe("opt")),
        (
            format!("{} version", config.compiler),
            toolchain::version_probe(&config.compiler),
        ),
        ("Make version".to_string(), toolchain::version_probe("make")),
    ];

    let test_binaries = match &config.test_bins {
        Some(dir) => test_binary_sizes(dir)?,
        None => Vec::new(),
    };
    let benchmark_orig = toolchain::binary_size(&orig_bin)
        .with_context(|| format!("failed to size baseline benchmark {}", orig_bin.display()))?;
    let benchmark_new = toolchain::binary_size(&new_bin)
        .with_context(|| format!("failed to size instrumented benchmark {}", new_bin.display()))?;

    let mut series = Vec::with_capacity(config.sizes.len());
    for &size in &config.sizes {
        info!(size, repetitions = config.repetitions, "benchmarking");
        series.push(run_series(&orig_bin, &new_bin, size, config)?);
    }

    Ok(Report {
        versioning,
        test_binaries,
        benchmark_orig,
        benchmark_new,
        series,
    })
}

/// Repeat the dual run for one size and fold the trial vectors.
fn run_series(
    orig_bin: &Path,
    new_bin: &Path,
    size: usize,
    config: &BenchConfig,
) -> Result<BenchmarkSeries> {
    let mut rng = rand::thread_rng();
    let mut used = HashSet::with_capacity(config.repetitions);
    let mut times_orig = Vec::with_capacity(config.repetitions);
    let mut times_new = Vec::with_capacity(config.repetitions);
    let mut mems_orig = Vec::with_capacity(config.repetitions);
    let mut mems_new = Vec::with_capacity(config.repetitions);

    for rep in 0..config.repetitions {
        let seed = draw_seed(&mut rng, &mut used);
        let trial = dual_run(orig_bin, new_bin, seed, size, config.timeout)?;
        debug!(rep, seed, size, "trial complete");
        times_orig.push(trial.time_orig);
        times_new.push(trial.time_new);
        mems_orig.push(trial.mem_orig as f64);
        mems_new.push(trial.mem_new as f64);
    }

    Ok(BenchmarkSeries {
        size,
        time_orig: stats::summarize(&times_orig)
            .with_context(|| format!("aggregating baseline times for size {size}"))?,
        time_new: stats::summarize(&times_new)
            .with_context(|| format!("aggregating instrumented times for size {size}"))?,
        mem_orig: stats::summarize(&mems_orig)
            .with_context(|| format!("aggregating baseline memory for size {size}"))?,
        mem_new: stats::summarize(&mems_new)
            .with_context(|| format!("aggregating instrumented memory for size {size}"))?,
    })
}

/// One trial of both builds with the same seed; baseline runs first.
fn dual_run(
    orig_bin: &Path,
    new_bin: &Path,
    seed: u32,
    size: usize,
    timeout: Duration,
) -> Result<Trial> {
    let orig = single_run(orig_bin, seed, size, timeout)?;
    let new = single_run(new_bin, seed, size, timeout)?;
    if orig.stdout != new.stdout {
        return Err(BenchError::BaselineDivergence { seed, size }.into());
    }
    Ok(Trial {
        time_orig: orig.elapsed,
        time_new: new.elapsed,
        mem_orig: orig.peak_rss,
        mem_new: new.peak_rss,
    })
}

/// Timed run followed by a memory-sampled run of the same invocation.
///
/// Sequential on purpose: sampling perturbs timing, so the timed run stays
/// unsampled and the two runs' outputs are cross-checked instead.
fn single_run(binary: &Path, seed: u32, size: usize, timeout: Duration) -> Result<SingleRun> {
    let args = vec![seed.to_string(), size.to_string()];
    let (timed, elapsed) = exec::run_timed(binary, &args, timeout)?;
    ensure_clean_exit(binary, &timed, seed, size)?;
    let (sampled, peak_rss) = exec::run_sampled(binary, &args, timeout)?;
    ensure_clean_exit(binary, &sampled, seed, size)?;
    if timed.stdout != sampled.stdout {
        return Err(BenchError::RunDivergence {
            binary: binary.display().to_string(),
            seed,
            size,
        }
        .into());
    }
    Ok(SingleRun {
        stdout: timed.stdout,
        elapsed: elapsed.as_secs_f64(),
        peak_rss,
    })
}

fn ensure_clean_exit(
    binary: &Path,
    result: &ExecutionResult,
    seed: u32,
    size: usize,
) -> Result<()> {
    if !result.exited_normally() {
        return Err(BenchError::WorkloadFailed {
            binary: binary.display().to_string(),
            exit_code: result.exit_code,
            seed,
            size,
            stderr: result.stderr.clone(),
        }
        .into());
    }
    Ok(())
}

/// Draw a seed not yet used in this series.
fn draw_seed(rng: &mut impl Rng, used: &mut HashSet<u32>) -> u32 {
    loop {
        let seed = rng.gen_range(0..=SEED_MAX);
        if used.insert(seed) {
            return seed;
        }
    }
}

/// Sizes of every `<name>.orig` / `<name>` binary pair under `dir`.
fn test_binary_sizes(dir: &Path) -> Result<Vec<SizePair>> {
    let mut pairs = Vec::new();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list test binaries in {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "orig") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let instrumented = dir.join(stem);
        if !instrumented.exists() {
            warn!(name = stem, "reference binary has no instrumented counterpart");
            continue;
        }
        pairs.push(SizePair {
            name: stem.to_string(),
            orig: toolchain::binary_size(&path)?,
            new: toolchain::binary_size(&instrumented)?,
        });
    }
    pairs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pairs)
}
