//! Compare random forest and histogram gradient boosting regressors.
//!
//! Runs a cross-validated grid search per model, prints a markdown report and
//! writes `report.md`, `cv_results.json`, `cv_results.csv` and
//! `comparison.svg` to the output directory.
//!
//! Examples:
//! - Synthetic housing data, reference grids:
//!   `cargo run --release --bin compare_ensembles`
//!
//! - The real California housing file, quick mode:
//!   `cargo run --release --bin compare_ensembles -- --data cal_housing.data --quick`
//!
//! - A TOML experiment:
//!   `cargo run --release --bin compare_ensembles -- --config bench.toml --out results`

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ensemble_bench::bench::{run_benchmark, BenchmarkConfig, DatasetConfig};
use ensemble_bench::report::{markdown_report, write_all};

#[derive(Debug, Parser)]
#[command(
    name = "compare_ensembles",
    about = "Grid-search benchmark of tree-ensemble regressors"
)]
struct Cli {
    /// TOML benchmark description (defaults to the reference experiment).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset file: `cal_housing.data`, `.csv` or `.parquet`.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Target column for CSV and parquet files.
    #[arg(long)]
    target: Option<String>,

    /// Rows of synthetic data.
    #[arg(long)]
    rows: Option<usize>,

    /// Tenth of the rows and the first three grid values only.
    #[arg(long)]
    quick: bool,

    /// Worker threads per estimator (0 = all cores).
    #[arg(long)]
    n_jobs: Option<usize>,

    /// Output directory for report artifacts.
    #[arg(long, default_value = "bench-results")]
    out: PathBuf,

    /// Debug logging.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    fn benchmark_config(&self) -> ensemble_bench::Result<BenchmarkConfig> {
        let mut config = match &self.config {
            Some(path) => BenchmarkConfig::from_toml_file(path)?,
            None => BenchmarkConfig::default(),
        };
        if let Some(path) = &self.data {
            config.dataset = DatasetConfig::from_path(path, self.target.as_deref());
        }
        if let Some(n) = self.rows {
            match &mut config.dataset {
                DatasetConfig::Synthetic { rows, .. } => *rows = n,
                _ => tracing::warn!("--rows only applies to synthetic data; ignoring"),
            }
        }
        if let Some(n_jobs) = self.n_jobs {
            config.n_jobs = n_jobs;
        }
        if self.quick {
            config = config.quick();
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(cli: &Cli) -> ensemble_bench::Result<()> {
    let config = cli.benchmark_config()?;
    let report = run_benchmark(&config)?;
    println!("{}", markdown_report(&report));
    let paths = write_all(&report, &cli.out)?;
    for path in paths {
        tracing::info!(path = %path.display(), "wrote");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())))
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut chain = vec![err.to_string()];
            let mut source = err.source();
            while let Some(cause) = source {
                chain.push(cause.to_string());
                source = cause.source();
            }
            tracing::error!(error = %chain.join(": "), "benchmark failed");
            ExitCode::FAILURE
        }
    }
}
