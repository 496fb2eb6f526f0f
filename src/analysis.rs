//! Per-report summaries and baseline comparison.
//!
//! A report with any failed round is never summarised: one failure poisons
//! the whole report so that partial successes are not averaged in.
//! Comparison pairs reports by name and never mutates either side.

use crate::result::{LookupError, Report, ReportSet};
use crate::stats;
use std::fmt;

/// Statistics shown for every report, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    Median,
    Mode,
    Minimum,
    Maximum,
    Quartile1,
    Quartile3,
    IqRange,
    StdDeviation,
    Normality,
}

impl Statistic {
    pub const ALL: [Statistic; 10] = [
        Statistic::Mean,
        Statistic::Median,
        Statistic::Mode,
        Statistic::Minimum,
        Statistic::Maximum,
        Statistic::Quartile1,
        Statistic::Quartile3,
        Statistic::IqRange,
        Statistic::StdDeviation,
        Statistic::Normality,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Mode => "mode",
            Statistic::Minimum => "minimum",
            Statistic::Maximum => "maximum",
            Statistic::Quartile1 => "quartile 1",
            Statistic::Quartile3 => "quartile 3",
            Statistic::IqRange => "IQ range",
            Statistic::StdDeviation => "std deviation",
            Statistic::Normality => "normality",
        }
    }

    /// Whether the value is a ratio rather than an iteration count.
    pub fn is_ratio(self) -> bool {
        matches!(self, Statistic::Normality)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Full statistics record of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub quartile1: f64,
    pub quartile3: f64,
    pub iq_range: f64,
    /// `None` when undefined (a single sample).
    pub std_deviation: Option<f64>,
    pub normality: f64,
}

impl Summary {
    /// Summarise a non-empty sequence.
    pub fn from_cells(cells: &[f64]) -> Self {
        let (quartile1, quartile3) = stats::quartiles(cells);

        Self {
            mean: stats::mean(cells),
            median: stats::median(cells),
            mode: stats::mode(cells),
            minimum: stats::minimum(cells),
            maximum: stats::maximum(cells),
            quartile1,
            quartile3,
            iq_range: quartile3 - quartile1,
            std_deviation: stats::standard_deviation(cells).ok(),
            normality: stats::normality(cells),
        }
    }

    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Mean => Some(self.mean),
            Statistic::Median => Some(self.median),
            Statistic::Mode => Some(self.mode),
            Statistic::Minimum => Some(self.minimum),
            Statistic::Maximum => Some(self.maximum),
            Statistic::Quartile1 => Some(self.quartile1),
            Statistic::Quartile3 => Some(self.quartile3),
            Statistic::IqRange => Some(self.iq_range),
            Statistic::StdDeviation => self.std_deviation,
            Statistic::Normality => Some(self.normality),
        }
    }
}

/// Analysis outcome of one report.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    Complete(Summary),
    Failed(String),
}

impl Analysis {
    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Analysis::Complete(summary) => Some(summary),
            Analysis::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Analysis::Failed(_))
    }
}

/// Summarise a report, or report it failed.
pub fn analyze(report: &Report) -> Analysis {
    if let Some(reason) = report.failure() {
        return Analysis::Failed(reason.to_string());
    }

    match report.cells() {
        Some(cells) if !cells.is_empty() => Analysis::Complete(Summary::from_cells(&cells)),
        _ => Analysis::Failed("no measurements".to_string()),
    }
}

/// Change from baseline to candidate for one statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    /// `(candidate - baseline) / baseline`.
    Relative(f64),
    /// Zero baseline or a side without a value.
    Undefined,
    /// Ratios are shown side by side without a delta.
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub statistic: Statistic,
    pub baseline: Option<f64>,
    pub candidate: Option<f64>,
    pub delta: Delta,
}

/// Result of pairing two reports.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Paired(Vec<ComparisonRow>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonEntry {
    pub name: String,
    pub outcome: PairOutcome,
}

/// Paired analysis of a baseline against a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub baseline_label: String,
    pub candidate_label: String,
    pub entries: Vec<ComparisonEntry>,
}

impl Comparison {
    /// Pair reports by name.
    ///
    /// Baseline order comes first, followed by workloads only the candidate
    /// has. A workload missing on either side yields a failed entry; the
    /// rest of the comparison is unaffected.
    pub fn between(baseline: &ReportSet, candidate: &ReportSet) -> Self {
        let mut entries = Vec::with_capacity(baseline.len());

        for report in baseline {
            let outcome = match candidate.get(report.name()) {
                Ok(other) => compare_reports(report, other),
                Err(_) => PairOutcome::Failed("missing from candidate".to_string()),
            };
            entries.push(ComparisonEntry {
                name: report.name().to_string(),
                outcome,
            });
        }

        for report in candidate.iter().filter(|r| !baseline.contains(r.name())) {
            entries.push(ComparisonEntry {
                name: report.name().to_string(),
                outcome: PairOutcome::Failed("missing from baseline".to_string()),
            });
        }

        Self {
            baseline_label: "baseline".to_string(),
            candidate_label: "candidate".to_string(),
            entries,
        }
    }

    /// Compare two workloads of the same run against each other.
    pub fn head_to_head(set: &ReportSet, baseline: &str, candidate: &str) -> Result<Self, LookupError> {
        let left = set.get(baseline)?;
        let right = set.get(candidate)?;

        Ok(Self {
            baseline_label: baseline.to_string(),
            candidate_label: candidate.to_string(),
            entries: vec![ComparisonEntry {
                name: format!("{} vs {}", baseline, candidate),
                outcome: compare_reports(left, right),
            }],
        })
    }

    /// Rename the two column labels.
    pub fn labels(mut self, baseline: impl Into<String>, candidate: impl Into<String>) -> Self {
        self.baseline_label = baseline.into();
        self.candidate_label = candidate.into();
        self
    }

    pub fn entry(&self, name: &str) -> Option<&ComparisonEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Analyse both reports and pair every statistic.
pub fn compare_reports(baseline: &Report, candidate: &Report) -> PairOutcome {
    let (base, cand) = match (analyze(baseline), analyze(candidate)) {
        (Analysis::Complete(b), Analysis::Complete(c)) => (b, c),
        (Analysis::Failed(reason), _) => {
            return PairOutcome::Failed(format!("baseline failed: {}", reason))
        }
        (_, Analysis::Failed(reason)) => {
            return PairOutcome::Failed(format!("candidate failed: {}", reason))
        }
    };

    let rows = Statistic::ALL
        .iter()
        .map(|&statistic| {
            let baseline = base.get(statistic);
            let candidate = cand.get(statistic);

            let delta = if statistic.is_ratio() {
                Delta::NotApplicable
            } else {
                match (baseline, candidate) {
                    (Some(b), Some(c)) => stats::relative_difference(b, c)
                        .map(Delta::Relative)
                        .unwrap_or(Delta::Undefined),
                    _ => Delta::Undefined,
                }
            };

            ComparisonRow {
                statistic,
                baseline,
                candidate,
                delta,
            }
        })
        .collect();

    PairOutcome::Paired(rows)
}
