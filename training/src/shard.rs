use std::ops::Range;

/// Splits `total` rows among `num_workers` and returns the shard for
/// `worker_id`.
///
/// Shards are contiguous, disjoint, cover `[0..total)` and differ in size by
/// at most one row.
///
/// # Panics
/// If `num_workers` is zero or `worker_id` is out of range.
pub fn shard_range(total: usize, worker_id: usize, num_workers: usize) -> Range<usize> {
    assert!(num_workers > 0, "at least one worker");
    assert!(worker_id < num_workers, "worker_id out of range");

    let base = total / num_workers;
    let rem = total % num_workers;

    let start = worker_id * base + worker_id.min(rem);
    let len = base + usize::from(worker_id < rem);

    start..start + len
}

/// Plans the shards for one epoch over `rows` rows, dropping empty shards
/// when there are more workers than rows.
pub(crate) fn plan(rows: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.min(rows).max(1);
    (0..workers)
        .map(|w| shard_range(rows, w, workers))
        .collect()
}
