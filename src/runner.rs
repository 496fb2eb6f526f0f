//! The benchmark orchestrator.

use crate::analysis::Comparison;
use crate::config::{BenchRunnerConfig, ConfigError};
use crate::measure::measure;
use crate::report::{ConsoleReporter, Reporter};
use crate::result::{timestamp, LookupError, PersistError, ReportSet};
use crate::workload::WorkloadRegistry;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub reports: ReportSet,
    /// Present when a baseline or a head-to-head comparison was requested.
    pub comparison: Option<Comparison>,
    /// Outcome of writing `reports` when a save path was configured. A
    /// failed save never discards the measurements.
    pub saved: Option<Result<PathBuf, PersistError>>,
}

/// Drives every workload through a fixed number of rounds.
///
/// Each round measures every workload once. Even rounds walk the workload
/// list front to back, odd rounds back to front, so slow drift over the
/// run (thermal throttling, background load) is spread evenly instead of
/// always penalising whichever workload runs last.
///
/// A workload that fails keeps its slot in every round; its report simply
/// analyses as failed.
///
/// # Example
///
/// ```rust,no_run
/// use iterbench::{BenchRunner, BenchRunnerConfig, WorkloadRegistry};
/// use std::time::Duration;
///
/// let mut registry = WorkloadRegistry::new();
/// registry.register_infallible("sum", || {
///     std::hint::black_box((0..100u64).sum::<u64>());
/// }).unwrap();
///
/// let config = BenchRunnerConfig::new()
///     .iterations(10)
///     .time_per_iteration(Duration::from_millis(5));
/// let outcome = BenchRunner::with_config(config).run(&mut registry).unwrap();
/// assert_eq!(outcome.reports["sum"].len(), 10);
/// ```
pub struct BenchRunner {
    config: BenchRunnerConfig,
    head_to_head: bool,
    reporters: Vec<Box<dyn Reporter>>,
}

impl BenchRunner {
    /// Create a new runner with default config from environment.
    pub fn new() -> Self {
        Self::with_config(BenchRunnerConfig::from_env())
    }

    /// Create a new runner with explicit config and a console reporter.
    pub fn with_config(config: BenchRunnerConfig) -> Self {
        Self {
            config,
            head_to_head: false,
            reporters: vec![Box::new(ConsoleReporter::default())],
        }
    }

    pub fn config(&self) -> &BenchRunnerConfig {
        &self.config
    }

    /// Replace reporters with a custom set.
    pub fn reporters(&mut self, reporters: Vec<Box<dyn Reporter>>) -> &mut Self {
        self.reporters = reporters;
        self
    }

    /// Add an additional reporter.
    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) -> &mut Self {
        self.reporters.push(reporter);
        self
    }

    /// Compare the first two workloads against each other when exactly two
    /// are selected. Ignored when a baseline file is configured.
    pub fn head_to_head(&mut self, enabled: bool) -> &mut Self {
        self.head_to_head = enabled;
        self
    }

    /// Measure every workload in `registry`.
    ///
    /// The configuration is validated, the baseline (if any) is loaded and
    /// the save directory is created before the first measurement, so bad
    /// settings fail fast. The registry is narrowed to the configured
    /// filter. Reporters see the results before they are written.
    pub fn run(&self, registry: &mut WorkloadRegistry) -> Result<RunOutcome, RunError> {
        self.config.validate()?;

        let baseline = match &self.config.baseline {
            Some(path) => Some(ReportSet::load(path)?),
            None => None,
        };

        if let Some(path) = &self.config.save {
            prepare_save_dir(path)?;
        }

        if let Some(pattern) = &self.config.filter {
            registry.retain_matching(pattern);
        }

        let reports = self.measure_rounds(registry);

        let comparison = match baseline {
            Some(baseline) => Some(Comparison::between(&baseline, &reports).labels("baseline", "latest")),
            None if self.head_to_head && reports.len() == 2 => {
                let names: Vec<&str> = reports.names().collect();
                Some(Comparison::head_to_head(&reports, names[0], names[1])?)
            }
            None => {
                if self.head_to_head {
                    tracing::warn!(
                        workloads = reports.len(),
                        "head-to-head needs exactly two workloads, showing plain results"
                    );
                }
                None
            }
        };

        for r in &self.reporters {
            match &comparison {
                Some(comparison) => r.comparison(comparison),
                None => r.suite_end(&reports),
            }
        }

        let saved = self.config.save.as_ref().map(|path| {
            reports.save(path).map(|()| path.clone()).map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "failed to save report set");
                e
            })
        });

        Ok(RunOutcome {
            reports,
            comparison,
            saved,
        })
    }

    fn measure_rounds(&self, registry: &mut WorkloadRegistry) -> ReportSet {
        let rounds = self.config.iterations;
        let budget = self.config.time_per_iteration;
        let names = registry.names();

        tracing::info!(
            workloads = names.len(),
            rounds,
            budget_ms = budget.as_secs_f64() * 1000.0,
            "starting benchmark"
        );
        for r in &self.reporters {
            r.suite_start(&names, &self.config);
        }

        let started = Instant::now();
        let mut reports = ReportSet::new();
        let mut failing: HashSet<String> = HashSet::new();
        let entries = registry.entries_mut();
        let count = entries.len();

        if count == 0 {
            tracing::warn!("no workloads to measure");
        }

        for round in 0..rounds {
            let ascending = round % 2 == 0;
            tracing::debug!(round, ascending, "starting round");

            for step in 0..count {
                let index = if ascending { step } else { count - 1 - step };
                let entry = &mut entries[index];
                let measurement = measure(entry, budget);

                if let Some(reason) = measurement.failure_reason() {
                    if failing.insert(entry.name().to_string()) {
                        tracing::warn!(workload = entry.name(), reason, "workload failed");
                    }
                }

                reports.add(entry.name(), measurement);
            }

            for r in &self.reporters {
                r.round_end(round + 1, rounds);
            }
        }

        tracing::info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            failed = failing.len(),
            "benchmark finished"
        );

        reports
    }
}

/// Create the parent directory of `path` up front.
///
/// Fails when a parent component exists but is not a directory.
fn prepare_save_dir(path: &Path) -> Result<(), PersistError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Where `--save [VALUE]` writes the report set.
///
/// A value ending in `.json` is used verbatim. Any other value is a label:
/// `benchmark_<label>_<timestamp>.json`, or `benchmark_<timestamp>.json`
/// without one.
pub fn save_path(value: Option<&str>) -> PathBuf {
    match value {
        Some(v) if v.ends_with(".json") => PathBuf::from(v),
        Some(label) if !label.is_empty() => {
            PathBuf::from(format!("benchmark_{}_{}.json", label, timestamp()))
        }
        _ => PathBuf::from(format!("benchmark_{}.json", timestamp())),
    }
}

impl Default for BenchRunner {
    fn default() -> Self {
        Self::new()
    }
}
