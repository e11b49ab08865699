//! Splitting a row range between workers.

use std::ops::Range;

/// Rows handled by `worker` out of `workers` when `jobs` rows are shared.
///
/// The first `jobs % workers` workers get one extra row, so sizes differ by at
/// most one and the ranges are consecutive, disjoint and cover `0..jobs`.
/// Returns `None` for a worker left without rows.
pub fn calc_job_range(worker: usize, workers: usize, jobs: usize) -> Option<Range<usize>> {
    if workers == 0 || worker >= workers {
        return None;
    }
    let step = jobs / workers;
    let rest = jobs - workers * step;
    let (start, len) = if worker < rest {
        (worker * (step + 1), step + 1)
    } else {
        (worker * step + rest, step)
    };
    (len > 0 && start < jobs).then(|| start..start + len)
}

/// Non-empty ranges of every worker, in worker order.
pub fn job_ranges(workers: usize, jobs: usize) -> Vec<Range<usize>> {
    (0..workers)
        .filter_map(|w| calc_job_range(w, workers, jobs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        assert_eq!(calc_job_range(0, 4, 8), Some(0..2));
        assert_eq!(calc_job_range(3, 4, 8), Some(6..8));
    }

    #[test]
    fn test_remainder_goes_first() {
        assert_eq!(job_ranges(3, 10), vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn test_more_workers_than_jobs() {
        assert_eq!(calc_job_range(1, 4, 2), Some(1..2));
        assert_eq!(calc_job_range(2, 4, 2), None);
        assert_eq!(calc_job_range(3, 4, 2), None);
        assert_eq!(job_ranges(4, 0), Vec::<Range<usize>>::new());
    }

    #[test]
    fn test_invalid_worker() {
        assert_eq!(calc_job_range(0, 0, 5), None);
        assert_eq!(calc_job_range(5, 5, 5), None);
    }
}
