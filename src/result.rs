//! Measurement containers and their persisted form.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Index;
use std::path::Path;

/// Outcome of measuring one workload for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    /// Iterations completed inside the time budget.
    Completed(u64),
    /// The workload reported an error; the reason is kept for display only.
    Failed(String),
}

impl Measurement {
    /// Iteration count, or `None` for a failed round.
    pub fn iterations(&self) -> Option<u64> {
        match self {
            Measurement::Completed(n) => Some(*n),
            Measurement::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Measurement::Failed(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Measurement::Completed(_) => None,
            Measurement::Failed(reason) => Some(reason),
        }
    }
}

/// Ordered measurement history of a single workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    name: String,
    data: Vec<Measurement>,
}

impl Report {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Vec::new(),
        }
    }

    /// Append one measurement. No validation happens here.
    pub fn add(&mut self, value: Measurement) {
        self.data.push(value);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Measurements in execution order.
    pub fn data(&self) -> &[Measurement] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// First failure reason, if any round failed.
    pub fn failure(&self) -> Option<&str> {
        self.data.iter().find_map(Measurement::failure_reason)
    }

    /// Iteration counts as floats, or `None` when any round failed.
    pub fn cells(&self) -> Option<Vec<f64>> {
        self.data
            .iter()
            .map(|m| m.iterations().map(|n| n as f64))
            .collect()
    }
}

/// Errors from looking up a report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("no report named '{0}'")]
    NotFound(String),
    #[error("report index {index} out of range for {len} reports")]
    OutOfRange { index: usize, len: usize },
}

/// Errors from saving or loading a report set.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed report set: {0}")]
    Format(#[from] serde_json::Error),
    #[error("report '{0}' appears more than once")]
    DuplicateReport(String),
}

/// Format version written into saved report sets.
const FORMAT_VERSION: u32 = 1;

/// All reports of one benchmark run, keyed by workload name.
///
/// Reports keep their insertion order. The set only grows: there is no
/// way to replace or remove a report once added, so a finished set can be
/// handed to comparison code without defensive copies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SavedReportSet", try_from = "SavedReportSet")]
pub struct ReportSet {
    reports: Vec<Report>,
    index: HashMap<String, usize>,
}

impl ReportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the report for `name`, creating it on first use.
    pub fn add(&mut self, name: &str, value: Measurement) {
        let position = match self.index.get(name) {
            Some(&position) => position,
            None => {
                self.reports.push(Report::new(name));
                let position = self.reports.len() - 1;
                self.index.insert(name.to_string(), position);
                position
            }
        };

        self.reports[position].add(value);
    }

    /// Insert a complete report.
    pub fn add_report(&mut self, report: Report) -> Result<(), PersistError> {
        if self.index.contains_key(report.name()) {
            return Err(PersistError::DuplicateReport(report.name().to_string()));
        }
        self.index
            .insert(report.name().to_string(), self.reports.len());
        self.reports.push(report);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Report, LookupError> {
        self.index
            .get(name)
            .map(|&position| &self.reports[position])
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }

    pub fn get_index(&self, index: usize) -> Result<&Report, LookupError> {
        self.reports.get(index).ok_or(LookupError::OutOfRange {
            index,
            len: self.reports.len(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.reports.iter().map(Report::name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Report> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Load a report set saved by [`ReportSet::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let set = serde_json::from_str(&content)?;
        tracing::info!(path = %path.as_ref().display(), "loaded report set");
        Ok(set)
    }

    /// Write the report set as JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), reports = self.len(), "saved report set");
        Ok(())
    }
}

impl Index<usize> for ReportSet {
    type Output = Report;

    fn index(&self, index: usize) -> &Report {
        &self.reports[index]
    }
}

impl Index<&str> for ReportSet {
    type Output = Report;

    fn index(&self, name: &str) -> &Report {
        match self.get(name) {
            Ok(report) => report,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<'a> IntoIterator for &'a ReportSet {
    type Item = &'a Report;
    type IntoIter = std::slice::Iter<'a, Report>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// On-disk layout of a report set.
#[derive(Serialize, Deserialize)]
struct SavedReportSet {
    version: u32,
    created_at: String,
    reports: Vec<Report>,
}

impl From<ReportSet> for SavedReportSet {
    fn from(set: ReportSet) -> Self {
        Self {
            version: FORMAT_VERSION,
            created_at: timestamp(),
            reports: set.reports,
        }
    }
}

impl TryFrom<SavedReportSet> for ReportSet {
    type Error = PersistError;

    fn try_from(saved: SavedReportSet) -> Result<Self, Self::Error> {
        let mut set = ReportSet::new();
        for report in saved.reports {
            set.add_report(report)?;
        }
        Ok(set)
    }
}

/// Unix time in milliseconds; sortable and safe in file names.
pub(crate) fn timestamp() -> String {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", duration.as_millis())
}
