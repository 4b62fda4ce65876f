//! Removal of municipalities whose beneficiary counts are all zero.
//!
//! Names are compared trimmed and lower-cased, so spelling variants that differ
//! only in case or surrounding whitespace form one group.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::types::{Metric, Record, View};

/// Grouping key for a municipality name
pub fn normalize_municipality(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Drop every record whose municipality group sums to zero over `metrics`.
///
/// Absent values count as zero here. With no metric columns the view is
/// returned unchanged.
pub fn drop_zero_municipalities<'a>(view: &[&'a Record], metrics: &[Metric]) -> View<'a> {
    if metrics.is_empty() {
        return view.to_vec();
    }

    let mut totals: HashMap<String, f64> = HashMap::new();
    for record in view {
        let sum: f64 = metrics
            .iter()
            .map(|&m| record.metric(m).unwrap_or(0.0))
            .sum();
        *totals
            .entry(normalize_municipality(&record.municipality))
            .or_insert(0.0) += sum;
    }

    let valid: HashSet<String> = totals
        .into_iter()
        .filter(|(_, total)| *total > 0.0)
        .map(|(name, _)| name)
        .collect();

    let kept: View<'a> = view
        .iter()
        .copied()
        .filter(|r| valid.contains(&normalize_municipality(&r.municipality)))
        .collect();

    debug!(
        before = view.len(),
        after = kept.len(),
        "zero-beneficiary municipalities removed"
    );
    kept
}
