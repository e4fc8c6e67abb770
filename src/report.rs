//! Fixed-format benchmark report
//!
//! The report is a de facto wire protocol: the downstream plotting tool
//! parses it positionally by label prefixes, chunk lengths (4/3 lines in the
//! sizes section, 7 lines per series block), and the 32-character section
//! separators. None of the literals here may change without changing the
//! consumer.

use std::io::Write;

use anyhow::Result;

use crate::stats::{self, Summary};

pub const VERSIONING_HEADER: &str = "===========versioning===========";
pub const BINARY_SIZES_HEADER: &str = "==========binary sizes==========";
pub const SEPARATOR: &str = "================================";

/// On-disk sizes of one instrumented/reference binary pair.
#[derive(Debug, Clone)]
pub struct SizePair {
    pub name: String,
    pub orig: u64,
    pub new: u64,
}

/// Aggregated measurements for one workload size.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkSeries {
    pub size: usize,
    /// Wall-clock seconds.
    pub time_orig: Summary,
    pub time_new: Summary,
    /// Peak resident set, bytes.
    pub mem_orig: Summary,
    pub mem_new: Summary,
}

/// The harness's terminal output artifact, ordered sections.
#[derive(Debug)]
pub struct Report {
    /// (label, probe output) pairs for the versioning section.
    pub versioning: Vec<(String, String)>,
    /// One 4-line chunk per instrumented test binary pair.
    pub test_binaries: Vec<SizePair>,
    /// The benchmark workload pair itself, final 3-line chunk.
    pub benchmark_orig: u64,
    pub benchmark_new: u64,
    /// One 7-line block per workload size, ascending.
    pub series: Vec<BenchmarkSeries>,
}

impl Report {
    pub fn render(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "{VERSIONING_HEADER}")?;
        for (label, text) in &self.versioning {
            writeln!(out, "{label}:")?;
            writeln!(out, "{text}")?;
            writeln!(out)?;
        }

        writeln!(out, "{BINARY_SIZES_HEADER}")?;
        for pair in &self.test_binaries {
            writeln!(out, "for file: {}", pair.name)?;
            writeln!(out, "orig size: {}", pair.orig)?;
            writeln!(out, "new size: {}", pair.new)?;
            let ratio = stats::overhead(pair.new as f64, pair.orig as f64)?;
            writeln!(out, "overhead: {ratio}")?;
        }
        writeln!(out, "orig benchmark: {}", self.benchmark_orig)?;
        writeln!(out, "new benchmark: {}", self.benchmark_new)?;
        let bench_ratio =
            stats::overhead(self.benchmark_new as f64, self.benchmark_orig as f64)?;
        writeln!(out, "overhead: {bench_ratio}")?;
        writeln!(out, "{SEPARATOR}")?;

        for series in &self.series {
            render_series(out, series)?;
        }
        Ok(())
    }
}

fn render_series(out: &mut impl Write, s: &BenchmarkSeries) -> Result<()> {
    writeln!(out, "run size: {}", s.size)?;
    writeln!(
        out,
        "original mean: {} (stdev {})",
        s.time_orig.mean, s.time_orig.stdev
    )?;
    writeln!(out, "new mean: {} (stdev {})", s.time_new.mean, s.time_new.stdev)?;
    writeln!(
        out,
        "time overhead: {}",
        stats::overhead(s.time_new.mean, s.time_orig.mean)?
    )?;
    writeln!(
        out,
        "peak mem usage original: {} (stdev {})",
        s.mem_orig.mean, s.mem_orig.stdev
    )?;
    writeln!(
        out,
        "new peak mem usage: {} (stdev {})",
        s.mem_new.mean, s.mem_new.stdev
    )?;
    writeln!(
        out,
        "space overhead: {}",
        stats::overhead(s.mem_new.mean, s.mem_orig.mean)?
    )?;
    writeln!(out, "{SEPARATOR}")?;
    Ok(())
}
