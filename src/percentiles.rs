//! HDR histogram percentiles of iteration counts.

use crate::result::Report;
use hdrhistogram::Histogram;

/// Iteration-count percentiles of one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percentiles {
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub max: u64,
}

/// Percentiles over the completed rounds of `report`.
///
/// Returns `None` for an empty report or one with a failed round.
pub fn percentiles(report: &Report) -> Option<Percentiles> {
    let mut histogram = Histogram::<u64>::new(3).ok()?;

    for m in report.data() {
        histogram.record(m.iterations()?).ok()?;
    }

    if histogram.is_empty() {
        return None;
    }

    Some(Percentiles {
        p50: histogram.value_at_quantile(0.50),
        p90: histogram.value_at_quantile(0.90),
        p99: histogram.value_at_quantile(0.99),
        max: histogram.max(),
    })
}
