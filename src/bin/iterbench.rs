//! iterbench: run the built-in workloads and compare saved runs.
//!
//! ```text
//! iterbench run                              # all workloads, 250 rounds of 50ms
//! iterbench run --filter 'str*' --histogram  # one workload with a histogram
//! iterbench run --save before                # benchmark_before_<timestamp>.json
//! iterbench run --compare before.json        # diff against a saved run
//! iterbench compare before.json after.json   # diff two saved runs
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use iterbench::{
    parse_millis, register_benchmarks, save_path, BenchRunner, BenchRunnerConfig, Comparison, ConsoleReporter,
    DisplayOptions, HistogramOptions, ReportSet, Reporter, WorkloadRegistry,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "iterbench",
    version,
    about = "Count workload iterations inside a fixed time budget",
    long_about = "
iterbench measures how many times each workload completes inside a time
budget, over many rounds, and summarises the counts. Higher is faster.

Rounds alternate the workload order to spread drift evenly. A workload that
fails in any round is reported as FAILED.
"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Measure the registered workloads
    Run(RunArgs),
    /// Compare two saved runs
    Compare(CompareArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    // ========================================================================
    // Workload Selection
    // ========================================================================
    /// Filter workloads by glob pattern (e.g., "str*", "*hash*")
    #[arg(long)]
    filter: Option<String>,

    /// List the selected workloads without running them
    #[arg(long)]
    list: bool,

    // ========================================================================
    // Execution Options
    // ========================================================================
    /// Number of rounds; every workload is measured once per round
    #[arg(long, default_value_t = 250)]
    iterations: usize,

    /// Time budget of one measurement in milliseconds (fractions allowed)
    #[arg(long, value_parser = parse_budget, default_value = "50")]
    time_per_iteration: Duration,

    // ========================================================================
    // Output Control
    // ========================================================================
    /// Draw a histogram of each workload's measurements
    #[arg(long)]
    histogram: bool,

    /// Number of histogram buckets
    #[arg(long, default_value_t = 16)]
    histogram_buckets: usize,

    /// Width of the longest histogram bar in characters
    #[arg(long, default_value_t = 50)]
    histogram_width: usize,

    /// List outliers under each workload
    #[arg(long)]
    show_outliers: bool,

    /// List every measurement under each workload
    #[arg(long)]
    show_all: bool,

    /// Verbose output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Quiet mode (results only, no header or progress)
    #[arg(long, short = 'q')]
    quiet: bool,

    // ========================================================================
    // Persistence and Comparison
    // ========================================================================
    /// Save results; a label, a path ending in .json, or nothing for a timestamped name
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    save: Option<String>,

    /// Compare results against a saved run
    #[arg(long)]
    compare: Option<PathBuf>,

    /// With exactly two workloads selected, compare the second against the first
    #[arg(long)]
    head_to_head: bool,
}

#[derive(Debug, Parser)]
struct CompareArgs {
    /// Baseline run
    baseline: PathBuf,

    /// Candidate run
    candidate: PathBuf,
}

fn parse_budget(value: &str) -> std::result::Result<Duration, String> {
    parse_millis(value).ok_or_else(|| format!("'{}' is not a number of milliseconds", value))
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run(args) => run(args),
        Commands::Compare(args) => compare(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let verbosity = Verbosity::from_args(&args);
    init_tracing(verbosity);

    let mut registry = WorkloadRegistry::new();
    register_benchmarks(&mut registry).context("Failed to register workloads")?;

    if args.list {
        if let Some(pattern) = &args.filter {
            registry.retain_matching(pattern);
        }
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let options = DisplayOptions {
        histogram: args.histogram.then_some(HistogramOptions {
            buckets: args.histogram_buckets,
            bar_width: args.histogram_width,
        }),
        show_outliers: args.show_outliers,
        show_all: args.show_all,
        show_progress: verbosity.is_normal(),
        ..DisplayOptions::default()
    };
    let reporter = ConsoleReporter::new(options).context("Invalid display options")?;

    let mut config = BenchRunnerConfig::new()
        .iterations(args.iterations)
        .time_per_iteration(args.time_per_iteration)
        .verbose(verbosity.is_normal());
    if let Some(pattern) = args.filter {
        config = config.filter(pattern);
    }
    if let Some(value) = args.save.as_deref() {
        config = config.save(save_path(Some(value).filter(|v| !v.is_empty())));
    }
    if let Some(path) = args.compare {
        if !path.exists() {
            bail!("Comparison file not found: {}", path.display());
        }
        config = config.baseline(path);
    }

    let mut runner = BenchRunner::with_config(config);
    runner
        .reporters(vec![Box::new(reporter)])
        .head_to_head(args.head_to_head);

    let outcome = runner.run(&mut registry).context("Benchmark run failed")?;

    match outcome.saved {
        Some(Ok(path)) => {
            if verbosity.is_normal() {
                eprintln!("Saved {} workload(s) to {}", outcome.reports.len(), path.display());
            }
        }
        Some(Err(e)) => return Err(e).context("Results were printed but could not be saved"),
        None => {}
    }

    Ok(())
}

fn compare(args: CompareArgs) -> Result<()> {
    init_tracing(Verbosity::Normal);

    let baseline = load(&args.baseline)?;
    let candidate = load(&args.candidate)?;

    let comparison =
        Comparison::between(&baseline, &candidate).labels(file_label(&args.baseline), file_label(&args.candidate));
    ConsoleReporter::default().comparison(&comparison);

    Ok(())
}

fn load(path: &Path) -> Result<ReportSet> {
    ReportSet::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Verbosity Control
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    fn from_args(args: &RunArgs) -> Self {
        if args.quiet {
            Verbosity::Quiet
        } else if args.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    fn is_quiet(&self) -> bool {
        *self == Verbosity::Quiet
    }

    fn is_normal(&self) -> bool {
        !self.is_quiet()
    }

    fn default_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
        }
    }
}

/// Logs go to stderr so result tables on stdout stay clean.
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
