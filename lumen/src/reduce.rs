//! Combining the partial results of many workers.
//!
//! [`WorkResult::put`] is elementwise addition, so partial results can be
//! merged pairwise in any grouping. The parallel reduction below relies on
//! that and does not fix the merge order.

use rayon::prelude::*;

use crate::work_result::WorkResult;

/// Merge all results into one, in parallel. Returns `None` for an empty input.
///
/// # Panics
///
/// Panics if the results were not built from the same configuration.
pub fn reduce_work_results(results: Vec<WorkResult>) -> Option<WorkResult> {
    let count = results.len();
    let merged = results.into_par_iter().reduce_with(|mut acc, other| {
        acc.put(&other);
        acc
    });

    tracing::debug!(count, "Reduced work results");
    merged
}

/// Accumulate every result of `results` into `acc`, sequentially.
pub fn fold_work_results<'a>(
    acc: &mut WorkResult,
    results: impl IntoIterator<Item = &'a WorkResult>,
) {
    let mut count = 0usize;
    for result in results {
        acc.put(result);
        count += 1;
    }
    tracing::trace!(count, "Folded work results");
}
