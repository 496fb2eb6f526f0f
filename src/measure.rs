//! Time-budgeted throughput measurement.

use crate::result::Measurement;
use crate::workload::WorkloadEntry;
use std::time::{Duration, Instant};

/// Count how many times `workload` completes within `budget`.
///
/// One warm-up call runs first and is not counted. The deadline is fixed
/// once, right before the timed loop, on the monotonic clock; the loop
/// checks it before every call, so the final call may finish slightly past
/// the deadline. The first error from the workload, warm-up included,
/// turns the whole measurement into [`Measurement::Failed`].
///
/// # Example
///
/// ```rust
/// use iterbench::{measure, Measurement, WorkloadRegistry};
/// use std::time::Duration;
///
/// let mut registry = WorkloadRegistry::new();
/// registry.register_infallible("noop", || {}).unwrap();
///
/// let noop = registry.get_mut("noop").unwrap();
/// let m = measure(noop, Duration::from_micros(200));
/// assert!(matches!(m, Measurement::Completed(_)));
/// ```
pub fn measure(workload: &mut WorkloadEntry, budget: Duration) -> Measurement {
    if let Err(e) = workload.call() {
        return Measurement::Failed(e.reason().to_string());
    }

    let deadline = Instant::now() + budget;
    let mut iterations: u64 = 0;

    while Instant::now() < deadline {
        if let Err(e) = workload.call() {
            return Measurement::Failed(e.reason().to_string());
        }
        iterations += 1;
    }

    tracing::trace!(workload = workload.name(), iterations, "measured");
    Measurement::Completed(iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::{WorkloadError, WorkloadRegistry};
    use std::cell::Cell;
    use std::rc::Rc;

    fn single(registry: &mut WorkloadRegistry) -> &mut WorkloadEntry {
        &mut registry.entries_mut()[0]
    }

    #[test]
    fn should_count_iterations_when_workload_succeeds() {
        let calls = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&calls);

        let mut registry = WorkloadRegistry::new();
        registry
            .register_infallible("count", move || counter.set(counter.get() + 1))
            .unwrap();

        let m = measure(single(&mut registry), Duration::from_millis(5));

        let iterations = m.iterations().unwrap();
        assert!(iterations > 0);
        // warm-up call is not counted
        assert_eq!(calls.get(), iterations + 1);
    }

    #[test]
    fn should_stop_near_deadline_when_budget_elapses() {
        let mut registry = WorkloadRegistry::new();
        registry
            .register_infallible("sleep", || std::thread::sleep(Duration::from_millis(2)))
            .unwrap();

        let start = Instant::now();
        let m = measure(single(&mut registry), Duration::from_millis(20));
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_millis(500));
        assert!(m.iterations().unwrap() <= 10);
    }

    #[test]
    fn should_accept_sub_millisecond_budget() {
        let mut registry = WorkloadRegistry::new();
        registry.register_infallible("noop", || {}).unwrap();

        let m = measure(single(&mut registry), Duration::from_micros(250));
        assert!(matches!(m, Measurement::Completed(_)));
    }

    #[test]
    fn should_fail_whole_measurement_when_any_call_fails() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&calls);

        let mut registry = WorkloadRegistry::new();
        registry
            .register("flaky", move || {
                counter.set(counter.get() + 1);
                if counter.get() == 3 {
                    Err(WorkloadError::new("third call broke"))
                } else {
                    Ok(())
                }
            })
            .unwrap();

        let m = measure(single(&mut registry), Duration::from_millis(50));
        assert_eq!(m, Measurement::Failed("third call broke".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn should_fail_when_warm_up_fails() {
        let mut registry = WorkloadRegistry::new();
        registry
            .register("dead", || Err(WorkloadError::new("unavailable")))
            .unwrap();

        let m = measure(single(&mut registry), Duration::from_millis(5));
        assert!(m.is_failed());
    }
}
