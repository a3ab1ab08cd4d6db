use std::ops::Range;

/// Splits `0..len` into `workers` contiguous ranges of `len / workers`
/// items, folding the remainder into the last range.
///
/// Every worker gets a range, possibly empty when `len < workers`.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let base = len / workers;
    let remainder = len % workers;
    (0..workers)
        .map(|i| {
            let start = i * base;
            let end = if i == workers - 1 {
                start + base + remainder
            } else {
                start + base
            };
            start..end
        })
        .collect()
}
