//! Row partitioning between workers.
//!
//! For every worker count and job count in a small grid of sizes:
//! - ranges are consecutive, disjoint and cover `0..jobs`
//! - sizes differ by at most one, larger ranges first
//! - workers beyond `jobs` receive nothing

use swe_flux::dispatch::{calc_job_range, job_ranges};

#[test]
fn test_ranges_cover_all_jobs_exactly_once() {
    for workers in 1..=12 {
        for jobs in 0..=50 {
            let mut next = 0;
            for worker in 0..workers {
                if let Some(r) = calc_job_range(worker, workers, jobs) {
                    assert_eq!(r.start, next, "workers={workers} jobs={jobs} worker={worker}");
                    assert!(!r.is_empty());
                    next = r.end;
                }
            }
            assert_eq!(next, jobs, "workers={workers} jobs={jobs}");
        }
    }
}

#[test]
fn test_sizes_are_balanced_and_front_loaded() {
    for workers in 1..=12 {
        for jobs in 0..=50 {
            let sizes: Vec<usize> = job_ranges(workers, jobs).iter().map(|r| r.len()).collect();
            if let (Some(max), Some(min)) = (sizes.iter().max(), sizes.iter().min()) {
                assert!(max - min <= 1, "workers={workers} jobs={jobs} sizes={sizes:?}");
            }
            assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "sizes={sizes:?}");
        }
    }
}

#[test]
fn test_idle_workers_get_nothing() {
    let ranges = job_ranges(8, 3);
    assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    for worker in 3..8 {
        assert_eq!(calc_job_range(worker, 8, 3), None);
    }
    assert!(job_ranges(4, 0).is_empty());
}

#[test]
fn test_degenerate_worker_counts() {
    assert_eq!(calc_job_range(0, 0, 10), None);
    assert_eq!(calc_job_range(5, 5, 10), None);
    assert_eq!(calc_job_range(0, 1, 10), Some(0..10));
}
