//! # iterbench
//!
//! A micro-benchmark harness that counts how many times a workload runs
//! inside a fixed time budget.
//!
//! Instead of timing a fixed number of calls, every measurement gives a
//! workload a wall-clock budget and records the iterations it completed.
//! Higher is faster. Workloads are measured over many rounds, alternating
//! the traversal order each round, and the per-round counts are summarised
//! with robust statistics (median, quartiles, outliers, a normality
//! heuristic). Saved runs can be compared against each other.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iterbench::{BenchRunner, BenchRunnerConfig, WorkloadError, WorkloadRegistry};
//! use std::time::Duration;
//!
//! let mut registry = WorkloadRegistry::new();
//! registry
//!     .register_infallible("concat", || {
//!         std::hint::black_box(format!("{}{}", "left", "right"));
//!     })
//!     .unwrap()
//!     .register("parse", || {
//!         "42".parse::<u32>().map(drop).map_err(|e| WorkloadError::new(e.to_string()))
//!     })
//!     .unwrap();
//!
//! let config = BenchRunnerConfig::new()
//!     .iterations(50)
//!     .time_per_iteration(Duration::from_millis(10))
//!     .save("baseline.json");
//!
//! let outcome = BenchRunner::with_config(config).run(&mut registry).unwrap();
//! for report in &outcome.reports {
//!     println!("{}: {:?}", report.name(), iterbench::analyze(report));
//! }
//! ```
//!
//! ## Features
//!
//! - **`hdr`**: Enable HDR histogram percentiles of iteration counts

pub mod stats;
mod result;
mod workload;
mod measure;
mod analysis;
mod config;
mod report;
mod runner;
mod benches;

pub use analysis::{
    analyze, compare_reports, Analysis, Comparison, ComparisonEntry, ComparisonRow, Delta, PairOutcome,
    Statistic, Summary,
};
pub use config::{parse_millis, BenchRunnerConfig, ConfigError, MIN_ITERATIONS};
pub use measure::measure;
pub use report::{
    format_number, format_percentage, render_histogram, ConsoleReporter, DisplayOptions, HistogramOptions,
    Reporter,
};
pub use result::{LookupError, Measurement, PersistError, Report, ReportSet};
pub use runner::{save_path, BenchRunner, RunError, RunOutcome};
pub use stats::{Bucket, StatsError};
pub use workload::{matches_glob, RegistryError, WorkloadEntry, WorkloadError, WorkloadFn, WorkloadRegistry};

// Re-export benches helper so the `iterbench` binary (or users) can call it
pub use benches::register_benchmarks;

#[cfg(feature = "hdr")]
pub mod percentiles;
