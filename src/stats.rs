//! Descriptive statistics over measurement sequences.
//!
//! Every function here is pure: it reads `cells` and never mutates them.
//! Functions that sort work on a private copy.
//!
//! All functions except [`relative_difference`] require a non-empty input.
//! Passing an empty slice is a contract violation and panics; callers
//! guard against it (a [`Report`](crate::Report) is never analysed before its
//! first measurement).
//!
//! Two operations are partial over valid input and return [`StatsError`]:
//! [`standard_deviation`] with a single sample and [`relative_difference`]
//! against a zero baseline.

/// Errors from statistics that are undefined for some inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("division by zero while computing {operation}")]
    DivisionByZero { operation: &'static str },
}

/// One histogram bucket covering `[range_start, range_end)`.
///
/// The last bucket of a histogram is closed on both sides so that the
/// maximum value is always counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub index: usize,
    pub range_start: f64,
    pub range_end: f64,
    pub count: usize,
}

fn assert_non_empty(cells: &[f64], operation: &str) {
    assert!(
        !cells.is_empty(),
        "{} requires at least one measurement",
        operation
    );
}

fn sorted(cells: &[f64]) -> Vec<f64> {
    let mut copy = cells.to_vec();
    copy.sort_by(f64::total_cmp);
    copy
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let count = sorted.len();
    let mid = count / 2;
    if count % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Arithmetic mean.
pub fn mean(cells: &[f64]) -> f64 {
    assert_non_empty(cells, "mean");
    cells.iter().sum::<f64>() / cells.len() as f64
}

/// Middle value of the sorted data; the average of the two central values
/// for an even count.
pub fn median(cells: &[f64]) -> f64 {
    assert_non_empty(cells, "median");
    median_of_sorted(&sorted(cells))
}

pub fn minimum(cells: &[f64]) -> f64 {
    assert_non_empty(cells, "minimum");
    cells.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn maximum(cells: &[f64]) -> f64 {
    assert_non_empty(cells, "maximum");
    cells.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Sample standard deviation with Bessel's correction.
///
/// Undefined for a single sample.
pub fn standard_deviation(cells: &[f64]) -> Result<f64, StatsError> {
    assert_non_empty(cells, "standard deviation");
    if cells.len() < 2 {
        return Err(StatsError::DivisionByZero {
            operation: "standard deviation",
        });
    }

    let mean = mean(cells);
    let sum_of_squares: f64 = cells.iter().map(|cell| (cell - mean).powi(2)).sum();

    Ok(sum_of_squares.sqrt() / ((cells.len() - 1) as f64).sqrt())
}

/// Every value sharing the highest occurrence count, lowest value first.
pub fn modes(cells: &[f64]) -> Vec<f64> {
    assert_non_empty(cells, "modes");

    // run-length over sorted data groups equal values
    let mut runs: Vec<(f64, usize)> = Vec::new();
    for value in sorted(cells) {
        match runs.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => runs.push((value, 1)),
        }
    }

    let highest = runs.iter().map(|(_, count)| *count).max().unwrap_or(0);

    runs.into_iter()
        .filter(|(_, count)| *count == highest)
        .map(|(value, _)| value)
        .collect()
}

/// Most frequent value. Ties resolve to the lowest value.
pub fn mode(cells: &[f64]) -> f64 {
    modes(cells)[0]
}

/// First and third quartiles, Tukey style.
///
/// The sorted data is split into a lower block made of the first
/// `n / 2` values and an upper block made of the last `n / 2` values; for an
/// odd count the middle value belongs to neither block. Q1 and Q3 are the
/// medians of those blocks. A single sample is its own Q1 and Q3.
pub fn quartiles(cells: &[f64]) -> (f64, f64) {
    assert_non_empty(cells, "quartiles");

    let sorted = sorted(cells);
    let count = sorted.len();
    let half = count / 2;

    if half == 0 {
        return (sorted[0], sorted[0]);
    }

    let lower = &sorted[..half];
    let upper = &sorted[count - half..];

    (median_of_sorted(lower), median_of_sorted(upper))
}

/// Q3 - Q1.
pub fn interquartile_range(cells: &[f64]) -> f64 {
    let (q1, q3) = quartiles(cells);
    q3 - q1
}

/// Lower and upper outlier fences: `Q1 - 1.5 IQR` and `Q3 + 1.5 IQR`.
pub fn fences(cells: &[f64]) -> (f64, f64) {
    let (q1, q3) = quartiles(cells);
    let iqr = q3 - q1;
    (q1 - 1.5 * iqr, q3 + 1.5 * iqr)
}

/// Values strictly outside the fences, in ascending order.
pub fn outliers(cells: &[f64]) -> Vec<f64> {
    let (lower, upper) = fences(cells);

    sorted(cells)
        .into_iter()
        .filter(|&cell| cell < lower || cell > upper)
        .collect()
}

/// Normality heuristic: `|mean - median| / max(mean, median)`.
///
/// Zero means mean and median coincide, as they do for a symmetric
/// distribution; larger values mean more skew. This is not a hypothesis
/// test and carries no p-value. All-zero data yields NaN.
pub fn normality(cells: &[f64]) -> f64 {
    let mean = mean(cells);
    let median = median(cells);

    (mean - median).abs() / mean.max(median)
}

/// Split the data range into `bucket_count` equal-width buckets and count
/// the values falling in each.
///
/// Counts always sum to `cells.len()`. When every value is identical the
/// range has zero width and all values land in the last bucket.
///
/// # Panics
///
/// Panics when `cells` is empty or `bucket_count` is zero.
pub fn histogram(cells: &[f64], bucket_count: usize) -> Vec<Bucket> {
    assert_non_empty(cells, "histogram");
    assert!(bucket_count > 0, "histogram requires at least one bucket");

    let sorted = sorted(cells);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let width = (max - min) / bucket_count as f64;

    let mut buckets: Vec<Bucket> = (0..bucket_count)
        .map(|index| Bucket {
            index,
            range_start: min + index as f64 * width,
            range_end: min + (index + 1) as f64 * width,
            count: 0,
        })
        .collect();

    // closed upper bound on the last bucket
    let last = bucket_count - 1;
    buckets[last].range_end = max;

    // sorted input lets a single forward cursor place every value
    let mut cursor = 0;
    for value in sorted {
        while cursor < last && value >= buckets[cursor].range_end {
            cursor += 1;
        }
        buckets[cursor].count += 1;
    }

    buckets
}

/// `(candidate - baseline) / baseline`.
pub fn relative_difference(baseline: f64, candidate: f64) -> Result<f64, StatsError> {
    if baseline == 0.0 {
        return Err(StatsError::DivisionByZero {
            operation: "relative difference",
        });
    }

    Ok((candidate - baseline) / baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn should_average_values_when_computing_mean() {
        assert!(approx(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5));
    }

    #[test]
    fn should_pick_middle_value_when_count_is_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn should_average_central_values_when_count_is_even() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn should_not_reorder_input_when_computing_median() {
        let cells = vec![3.0, 1.0, 2.0];
        let _ = median(&cells);
        assert_eq!(cells, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "at least one measurement")]
    fn should_panic_when_input_is_empty() {
        mean(&[]);
    }

    #[test]
    fn should_return_zero_deviation_when_values_are_constant() {
        assert_eq!(standard_deviation(&[2.0, 2.0, 2.0, 2.0]), Ok(0.0));
    }

    #[test]
    fn should_apply_bessel_correction_when_computing_deviation() {
        // squares sum to 32 around a mean of 5, n - 1 = 7
        let cells = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = 32.0_f64.sqrt() / 7.0_f64.sqrt();
        assert!(approx(standard_deviation(&cells).unwrap(), expected));
    }

    #[test]
    fn should_fail_deviation_when_single_sample() {
        assert!(matches!(
            standard_deviation(&[42.0]),
            Err(StatsError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn should_pick_most_frequent_value_when_computing_mode() {
        assert_eq!(mode(&[1.0, 1.0, 2.0, 3.0, 3.0, 3.0]), 3.0);
    }

    #[test]
    fn should_pick_lowest_value_when_modes_tie() {
        assert_eq!(mode(&[2.0, 2.0, 1.0, 1.0]), 1.0);
        assert_eq!(modes(&[2.0, 2.0, 1.0, 1.0, 5.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn should_split_halves_when_computing_quartiles_of_even_count() {
        let cells = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(quartiles(&cells), (2.5, 6.5));
        assert_eq!(interquartile_range(&cells), 4.0);
    }

    #[test]
    fn should_exclude_middle_value_when_count_is_odd() {
        // lower block [1, 2, 3], upper block [5, 6, 7]
        let cells = [7.0, 1.0, 6.0, 2.0, 4.0, 3.0, 5.0];
        assert_eq!(quartiles(&cells), (2.0, 6.0));
    }

    #[test]
    fn should_use_single_value_when_quartiles_of_one_sample() {
        assert_eq!(quartiles(&[9.0]), (9.0, 9.0));
    }

    #[test]
    fn should_flag_far_value_when_detecting_outliers() {
        let found = outliers(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        assert_eq!(found, vec![100.0]);
    }

    #[test]
    fn should_report_outliers_ascending_when_both_sides_present() {
        let cells = [-500.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 500.0];
        assert_eq!(outliers(&cells), vec![-500.0, 500.0]);
    }

    #[test]
    fn should_return_zero_normality_when_mean_equals_median() {
        assert_eq!(normality(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn should_measure_skew_when_mean_differs_from_median() {
        // mean 4, median 2
        assert!(approx(normality(&[1.0, 2.0, 9.0]), 0.5));
    }

    #[test]
    fn should_cover_full_range_when_building_histogram() {
        let cells = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0];
        let buckets = histogram(&cells, 5);

        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[0].range_start, 0.0);
        assert_eq!(buckets[4].range_end, 10.0);
        let counts: Vec<_> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn should_count_maximum_in_last_bucket_when_on_upper_edge() {
        let buckets = histogram(&[0.0, 10.0], 2);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn should_place_everything_last_when_values_are_constant() {
        let buckets = histogram(&[3.0, 3.0, 3.0], 4);
        let counts: Vec<_> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![0, 0, 0, 3]);
    }

    #[test]
    fn should_compute_relative_difference_when_baseline_nonzero() {
        assert!(approx(relative_difference(100.0, 110.0).unwrap(), 0.10));
        assert!(approx(relative_difference(200.0, 150.0).unwrap(), -0.25));
    }

    #[test]
    fn should_fail_relative_difference_when_baseline_is_zero() {
        assert_eq!(
            relative_difference(0.0, 5.0),
            Err(StatsError::DivisionByZero {
                operation: "relative difference"
            })
        );
    }

    proptest! {
        #[test]
        fn histogram_counts_every_value_exactly_once(
            data in prop::collection::vec(0u32..100_000, 1..200),
            buckets in 1usize..40,
        ) {
            let cells: Vec<f64> = data.iter().map(|&v| v as f64).collect();
            let histogram = histogram(&cells, buckets);

            let total: usize = histogram.iter().map(|b| b.count).sum();
            prop_assert_eq!(total, cells.len());

            let last = histogram.len() - 1;
            for &value in &cells {
                let holders = histogram
                    .iter()
                    .filter(|b| {
                        value >= b.range_start
                            && (value < b.range_end || (b.index == last && value <= b.range_end))
                    })
                    .count();
                prop_assert_eq!(holders, 1);
            }
        }

        #[test]
        fn quartiles_bracket_the_median(data in prop::collection::vec(0u32..10_000, 1..100)) {
            let cells: Vec<f64> = data.iter().map(|&v| v as f64).collect();
            let (q1, q3) = quartiles(&cells);
            let median = median(&cells);

            prop_assert!(q1 <= median && median <= q3);
            prop_assert!(interquartile_range(&cells) >= 0.0);
        }

        #[test]
        fn outliers_lie_outside_fences(data in prop::collection::vec(0u32..10_000, 1..100)) {
            let cells: Vec<f64> = data.iter().map(|&v| v as f64).collect();
            let (lower, upper) = fences(&cells);

            for value in outliers(&cells) {
                prop_assert!(value < lower || value > upper);
            }
        }
    }
}
