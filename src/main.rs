use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use sanharness::{
    bench,
    catalog::Catalog,
    cli::{Cli, Command},
    runner,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    match args.command {
        Command::Test {
            dir,
            catalog,
            compiler,
            timeout_secs,
        } => {
            let catalog_path = catalog.unwrap_or_else(|| dir.join("catalog.toml"));
            let catalog = Catalog::from_file(&catalog_path)?;
            if catalog.is_empty() {
                anyhow::bail!("catalog {} registers no tests", catalog_path.display());
            }
            let config = runner::RunnerConfig {
                dir,
                compiler,
                timeout: Duration::from_secs(timeout_secs),
            };
            runner::run(&catalog, &config)?;
        }
        Command::Bench {
            dir,
            sizes,
            repetitions,
            test_bins,
            compiler,
            timeout_secs,
        } => {
            if repetitions < 2 {
                anyhow::bail!(
                    "--repetitions must be at least 2 to compute a standard deviation, got {repetitions}"
                );
            }
            if sizes.is_empty() {
                anyhow::bail!("--sizes must name at least one workload size");
            }
            if sizes.windows(2).any(|w| w[0] >= w[1]) || sizes[0] == 0 {
                anyhow::bail!("--sizes must be positive and strictly ascending");
            }
            let config = bench::BenchConfig {
                dir,
                test_bins,
                sizes,
                repetitions,
                timeout: Duration::from_secs(timeout_secs),
                compiler,
            };
            let report = bench::run(&config)?;
            report.render(&mut std::io::stdout().lock())?;
        }
    }

    Ok(())
}
