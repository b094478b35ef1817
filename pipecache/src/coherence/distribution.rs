//! Aggregation of distribution summaries across cache pages.

use crate::core::{CacheEntry, DistributionKind, DistributionMap, LabelCounts};

/// Sums label counts over all pages, per distribution kind.
///
/// The fold is a commutative sum, so page order never changes the result.
/// Kinds with no labels across all pages are omitted.
#[must_use]
pub fn aggregate(entries: &[CacheEntry]) -> DistributionMap {
    DistributionKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let totals = entries.iter().fold(LabelCounts::new(), |mut totals, entry| {
                merge_into(&mut totals, entry.distribution(kind));
                totals
            });
            (!totals.is_empty()).then_some((kind, totals))
        })
        .collect()
}

fn merge_into(totals: &mut LabelCounts, counts: &LabelCounts) {
    for (label, count) in counts {
        let total = totals.entry(label.clone()).or_insert(0);
        *total = total.saturating_add(*count);
    }
}
