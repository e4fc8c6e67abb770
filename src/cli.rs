//! CLI argument parsing for the sanitizer harness

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sanharness")]
#[command(version)]
#[command(
    about = "Differential testing and overhead benchmarking for memory-safety sanitizers",
    long_about = None
)]
pub struct Cli {
    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the differential test pass over the instrumented test catalog
    Test {
        /// Test tree root (contains src/ and bin/)
        #[arg(long, default_value = "test")]
        dir: PathBuf,

        /// Catalog file of expected outcomes (default: <dir>/catalog.toml)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// External C compiler for reference builds
        #[arg(long, default_value = "gcc")]
        compiler: String,

        /// Deadline per child process, in seconds
        #[arg(long = "timeout", value_name = "SECS", default_value = "60")]
        timeout_secs: u64,
    },
    /// Measure time, memory, and binary-size overhead of instrumentation
    Bench {
        /// Benchmark tree root (contains bin/benchmark and bin/benchmark.orig)
        #[arg(long, default_value = "benchmark")]
        dir: PathBuf,

        /// Workload sizes, ascending
        #[arg(
            long,
            value_delimiter = ',',
            default_values_t = vec![10usize, 100, 1000, 10000, 100000]
        )]
        sizes: Vec<usize>,

        /// Trials per size (minimum 2)
        #[arg(long, default_value = "1000")]
        repetitions: usize,

        /// Directory of instrumented test binaries (with .orig pairs) for the
        /// binary-size section
        #[arg(long)]
        test_bins: Option<PathBuf>,

        /// C compiler reported in the versioning section
        #[arg(long, default_value = "gcc")]
        compiler: String,

        /// Deadline per child process, in seconds
        #[arg(long = "timeout", value_name = "SECS", default_value = "300")]
        timeout_secs: u64,
    },
}
