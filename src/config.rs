//! Configuration for the benchmark runner.

use std::path::PathBuf;
use std::time::Duration;

/// Smallest round count that yields a defined standard deviation.
pub const MIN_ITERATIONS: usize = 2;

/// Configuration for the benchmark runner.
#[derive(Debug, Clone)]
pub struct BenchRunnerConfig {
    /// Number of rounds; every workload is measured once per round.
    pub iterations: usize,
    /// Time budget for a single measurement.
    pub time_per_iteration: Duration,
    /// Filter workloads by glob pattern.
    pub filter: Option<String>,
    /// Save the finished report set to this path.
    pub save: Option<PathBuf>,
    /// Compare the finished report set against this saved baseline.
    pub baseline: Option<PathBuf>,
    /// Print progress to stdout.
    pub verbose: bool,
}

impl Default for BenchRunnerConfig {
    fn default() -> Self {
        Self {
            iterations: 250,
            time_per_iteration: Duration::from_millis(50),
            filter: None,
            save: None,
            baseline: None,
            verbose: true,
        }
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least 2 iterations are required, got {0}")]
    TooFewIterations(usize),
    #[error("time per iteration must be greater than zero")]
    EmptyBudget,
    #[error("histogram needs at least one bucket")]
    NoBuckets,
    #[error("histogram bar width must be greater than zero")]
    NoBarWidth,
}

impl BenchRunnerConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from environment variables.
    ///
    /// Supported variables:
    /// - `BENCH_ITERATIONS`: number of rounds (default: 250)
    /// - `BENCH_TIME_PER_ITERATION_MS`: budget in milliseconds, fractions allowed (default: 50)
    /// - `BENCH_FILTER`: filter workloads by glob
    /// - `BENCH_SAVE`: save results to this path
    /// - `BENCH_BASELINE`: compare against this saved baseline
    /// - `BENCH_VERBOSE`: verbose output (default: true)
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("BENCH_ITERATIONS") {
            if let Ok(n) = v.parse() {
                cfg.iterations = n;
            }
        }
        if let Ok(v) = std::env::var("BENCH_TIME_PER_ITERATION_MS") {
            if let Some(d) = parse_millis(&v) {
                cfg.time_per_iteration = d;
            }
        }
        if let Ok(v) = std::env::var("BENCH_FILTER") {
            cfg.filter = Some(v);
        }
        if let Ok(v) = std::env::var("BENCH_SAVE") {
            cfg.save = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("BENCH_BASELINE") {
            cfg.baseline = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("BENCH_VERBOSE") {
            cfg.verbose = v != "0" && !v.eq_ignore_ascii_case("false");
        }

        cfg
    }

    /// Check the settings before any measurement starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations < MIN_ITERATIONS {
            return Err(ConfigError::TooFewIterations(self.iterations));
        }
        if self.time_per_iteration.is_zero() {
            return Err(ConfigError::EmptyBudget);
        }
        Ok(())
    }

    /// Set the number of rounds.
    pub fn iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// Set the per-measurement time budget.
    pub fn time_per_iteration(mut self, budget: Duration) -> Self {
        self.time_per_iteration = budget;
        self
    }

    /// Set filter pattern.
    pub fn filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    /// Clear filter pattern.
    pub fn no_filter(mut self) -> Self {
        self.filter = None;
        self
    }

    /// Save results to `path` when the run finishes.
    pub fn save(mut self, path: impl Into<PathBuf>) -> Self {
        self.save = Some(path.into());
        self
    }

    /// Compare results against the baseline saved at `path`.
    pub fn baseline(mut self, path: impl Into<PathBuf>) -> Self {
        self.baseline = Some(path.into());
        self
    }

    /// Set verbose output.
    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }
}

/// Parse a fractional millisecond count such as `"0.25"` or `"50"`.
pub fn parse_millis(value: &str) -> Option<Duration> {
    let millis: f64 = value.trim().parse().ok()?;
    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    Some(Duration::from_nanos((millis * 1_000_000.0).round() as u64))
}
