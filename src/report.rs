//! Pluggable reporters for benchmark output.
//!
//! Reporters never fail the run: rendering is infallible and write errors
//! are logged, not propagated. Every block of output is rendered into a
//! string first and written in one call so lines cannot interleave.

use crate::analysis::{analyze, Analysis, Comparison, Delta, PairOutcome, Statistic};
use crate::config::{BenchRunnerConfig, ConfigError};
use crate::result::{Report, ReportSet};
use crate::stats::{self, Bucket};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Trait for benchmark result reporters.
pub trait Reporter: Send + Sync {
    /// Called once before the first round.
    fn suite_start(&self, _workloads: &[&str], _config: &BenchRunnerConfig) {}

    /// Called after every round; `round` counts from 1.
    fn round_end(&self, _round: usize, _rounds: usize) {}

    /// Called with the finished report set when no comparison was requested.
    fn suite_end(&self, _reports: &ReportSet) {}

    /// Called instead of `suite_end` when the run produced a comparison.
    fn comparison(&self, _comparison: &Comparison) {}
}

/// Values printed per line when listing outliers or raw measurements.
const VALUES_PER_LINE: usize = 32;

/// Histogram rendering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramOptions {
    pub buckets: usize,
    pub bar_width: usize,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            buckets: 16,
            bar_width: 50,
        }
    }
}

/// Layout and content options for console output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Width of the label column.
    pub name_width: usize,
    /// Width of each value column.
    pub value_width: usize,
    /// Draw a histogram under each report.
    pub histogram: Option<HistogramOptions>,
    /// List outliers under each report.
    pub show_outliers: bool,
    /// List every measurement under each report.
    pub show_all: bool,
    /// Print a progress line after each round.
    pub show_progress: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            name_width: 19,
            value_width: 14,
            histogram: None,
            show_outliers: false,
            show_all: false,
            show_progress: true,
        }
    }
}

impl DisplayOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(h) = self.histogram {
            if h.buckets == 0 {
                return Err(ConfigError::NoBuckets);
            }
            if h.bar_width == 0 {
                return Err(ConfigError::NoBarWidth);
            }
        }
        Ok(())
    }
}

/// Console reporter that prints tables to stdout.
pub struct ConsoleReporter {
    options: DisplayOptions,
    output_lock: Mutex<()>,
    /// Mirrors `BenchRunnerConfig::verbose` of the running suite.
    verbose: AtomicBool,
}

impl ConsoleReporter {
    /// Create a reporter, rejecting options that cannot be rendered.
    pub fn new(options: DisplayOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self::with_valid(options))
    }

    fn with_valid(options: DisplayOptions) -> Self {
        Self {
            options,
            output_lock: Mutex::new(()),
            verbose: AtomicBool::new(true),
        }
    }

    /// Progress text after `round` of `rounds`, or `None` when progress is
    /// hidden by the display options or a non-verbose suite.
    pub fn progress_line(&self, round: usize, rounds: usize) -> Option<String> {
        if !self.options.show_progress || !self.verbose.load(Ordering::Relaxed) {
            return None;
        }

        let progress = format_percentage(round as f64 / rounds as f64, false, 0);
        let ending = if round == rounds { "\n" } else { "" };
        Some(format!("\rRunning rounds {}...{}", progress, ending))
    }

    fn line(&self, value_columns: usize) -> String {
        "-".repeat(self.options.name_width + value_columns * self.options.value_width + 3)
    }

    fn label(&self, text: &str) -> String {
        format!("{:<width$} : ", text, width = self.options.name_width)
    }

    /// Render the statistics block of one report.
    pub fn render_report(&self, report: &Report) -> String {
        let width = self.options.value_width;
        let line = self.line(1);
        let mut out = String::new();

        let summary = match analyze(report) {
            Analysis::Complete(summary) => summary,
            Analysis::Failed(reason) => {
                out.push_str(&self.label(report.name()));
                out.push_str(&format!("{:>width$}  {}\n", "FAILED", reason, width = width));
                out.push_str(&line);
                out.push('\n');
                return out;
            }
        };

        out.push_str(&self.label(report.name()));
        out.push_str(&format!("{:>width$}\n", "iterations", width = width));

        for statistic in Statistic::ALL {
            out.push_str(&self.label(statistic.label()));
            let value = summary.get(statistic);
            if statistic.is_ratio() {
                out.push_str(&format_percentage(value.unwrap_or(f64::NAN), false, width));
            } else {
                out.push_str(&format_number(value.unwrap_or(f64::NAN), width));
            }
            out.push('\n');
        }

        #[cfg(feature = "hdr")]
        self.push_percentiles(report, &mut out);

        // a complete analysis guarantees every round succeeded
        let cells = report.cells().unwrap_or_default();

        if let Some(h) = self.options.histogram {
            out.push('\n');
            out.push_str(&render_histogram(&stats::histogram(&cells, h.buckets), h.bar_width));
        }

        if self.options.show_outliers {
            out.push('\n');
            out.push_str(&self.label("outliers"));
            out.push_str(&format_values(&stats::outliers(&cells)));
        }

        if self.options.show_all {
            out.push('\n');
            out.push_str(&self.label("values"));
            out.push_str(&format_values(&cells));
        }

        out.push_str(&line);
        out.push('\n');
        out
    }

    /// Render a baseline comparison table.
    pub fn render_comparison(&self, comparison: &Comparison) -> String {
        let width = self.options.value_width;
        let line = self.line(3);
        let mut out = String::new();

        out.push_str(&line);
        out.push('\n');

        for entry in &comparison.entries {
            let rows = match &entry.outcome {
                PairOutcome::Paired(rows) => rows,
                PairOutcome::Failed(reason) => {
                    out.push_str(&self.label(&entry.name));
                    out.push_str(&format!("{:>width$}  {}\n", "FAILED", reason, width = width));
                    out.push_str(&line);
                    out.push('\n');
                    continue;
                }
            };

            out.push_str(&self.label(&entry.name));
            out.push_str(&format!(
                "{:>width$}{:>width$}\n",
                comparison.baseline_label,
                comparison.candidate_label,
                width = width
            ));

            for row in rows {
                out.push_str(&self.label(row.statistic.label()));
                let baseline = row.baseline.unwrap_or(f64::NAN);
                let candidate = row.candidate.unwrap_or(f64::NAN);

                match row.delta {
                    Delta::NotApplicable => {
                        out.push_str(&format_percentage(baseline, false, width));
                        out.push_str(&format_percentage(candidate, false, width));
                    }
                    Delta::Relative(delta) => {
                        out.push_str(&format_number(baseline, width));
                        out.push_str(&format_number(candidate, width));
                        out.push_str(&format_percentage(delta, true, width));
                    }
                    Delta::Undefined => {
                        out.push_str(&format_number(baseline, width));
                        out.push_str(&format_number(candidate, width));
                        out.push_str(&format!("{:>width$}", "nan", width = width));
                    }
                }
                out.push('\n');
            }

            out.push_str(&line);
            out.push('\n');
        }

        out
    }

    #[cfg(feature = "hdr")]
    fn push_percentiles(&self, report: &Report, out: &mut String) {
        if let Some(p) = crate::percentiles::percentiles(report) {
            for (label, value) in [("p50", p.p50), ("p90", p.p90), ("p99", p.p99), ("p max", p.max)] {
                out.push_str(&self.label(label));
                out.push_str(&format_number(value as f64, self.options.value_width));
                out.push('\n');
            }
        }
    }

    fn write_stdout(&self, message: &str) {
        let _guard = self.output_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = write!(stdout, "{}", message).and_then(|_| stdout.flush()) {
            tracing::warn!(error = %e, "failed to write to stdout");
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::with_valid(DisplayOptions::default())
    }
}

impl Reporter for ConsoleReporter {
    fn suite_start(&self, workloads: &[&str], config: &BenchRunnerConfig) {
        self.verbose.store(config.verbose, Ordering::Relaxed);
        if !config.verbose {
            return;
        }

        let line = self.line(1);
        let width = self.options.value_width;
        let platform = format!("{} {}", std::env::consts::OS, std::env::consts::ARCH);

        let mut header = format!("iterbench {}\n\n{}\n", env!("CARGO_PKG_VERSION"), line);
        let rows = [
            ("platform", platform),
            (
                "time per iteration",
                format!("{}ms", config.time_per_iteration.as_secs_f64() * 1000.0),
            ),
            ("iterations", config.iterations.to_string()),
            ("workloads", workloads.len().to_string()),
        ];
        for (label, value) in rows {
            header.push_str(&self.label(label));
            header.push_str(&format!("{:>width$}\n", value, width = width));
        }
        header.push_str(&line);
        header.push('\n');

        self.write_stdout(&header);
    }

    fn round_end(&self, round: usize, rounds: usize) {
        if let Some(line) = self.progress_line(round, rounds) {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }

    fn suite_end(&self, reports: &ReportSet) {
        let mut out = String::new();
        for report in reports {
            out.push_str(&self.render_report(report));
        }
        self.write_stdout(&out);
    }

    fn comparison(&self, comparison: &Comparison) {
        self.write_stdout(&self.render_comparison(comparison));
    }
}

/// Draw a histogram as a bordered table with one bar per bucket.
///
/// Bar length is proportional to the bucket count, the fullest bucket
/// spanning `bar_width` characters.
pub fn render_histogram(buckets: &[Bucket], bar_width: usize) -> String {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);

    let header = format!(
        "| bucket | range end | count | {:<bar_width$} |",
        "bar",
        bar_width = bar_width
    );
    let border = format!("+{}+", "-".repeat(header.chars().count() - 2));

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    out.push_str(&header);
    out.push('\n');
    out.push_str(&border);
    out.push('\n');

    for bucket in buckets {
        let bar_len = if max == 0 {
            0
        } else {
            (bar_width as f64 * bucket.count as f64 / max as f64).round() as usize
        };
        out.push_str(&format!(
            "| {:>6} | {:>9.0} | {:>5} | {:<bar_width$} |\n",
            bucket.index,
            bucket.range_end,
            bucket.count,
            "|".repeat(bar_len),
            bar_width = bar_width
        ));
    }

    out.push_str(&border);
    out.push('\n');
    out
}

/// Right-aligned whole number; NaN renders as `nan`.
pub fn format_number(value: f64, width: usize) -> String {
    if value.is_nan() {
        return format!("{:>width$}", "nan", width = width);
    }
    format!("{:>width$.0}", value, width = width)
}

/// Right-aligned percentage with one decimal.
///
/// With `sign`, positive values carry a leading `+`.
pub fn format_percentage(value: f64, sign: bool, width: usize) -> String {
    if value.is_nan() {
        return format!("{:>width$}", "nan", width = width);
    }
    let prefix = if sign && value > 0.0 { "+" } else { "" };
    let text = format!("{}{:.1}%", prefix, value * 100.0);
    format!("{:>width$}", text, width = width)
}

/// Space-separated values, starting on a fresh paragraph, wrapped every
/// [`VALUES_PER_LINE`] values.
fn format_values(values: &[f64]) -> String {
    let mut out = String::from("\n\n");
    for (i, value) in values.iter().enumerate() {
        out.push_str(&format_number(*value, 0));
        out.push(' ');
        if (i + 1) % VALUES_PER_LINE == 0 {
            out.push('\n');
        }
    }
    out.push_str("\n\n");
    out
}
