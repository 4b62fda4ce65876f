use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::types::{Dimension, Metric, Record, Series, SeriesPoint};

/// Sum of a metric over a view, skipping absent values.
///
/// `None` when no record in the view carries a value.
pub fn sum_metric(view: &[&Record], metric: Metric) -> Option<f64> {
    view.iter()
        .filter_map(|r| r.metric(metric))
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Group a view by a dimension and sum the chosen metric per group.
///
/// One entry per distinct observed label, ordered by label. A group with no
/// present value has a `None` entry rather than zero.
pub fn aggregate(view: &[&Record], dimension: Dimension, metric: Metric) -> Series {
    let mut groups: BTreeMap<&str, Option<f64>> = BTreeMap::new();
    for record in view {
        let entry = groups.entry(record.category(dimension)).or_insert(None);
        if let Some(value) = record.metric(metric) {
            *entry = Some(entry.unwrap_or(0.0) + value);
        }
    }

    groups
        .into_iter()
        .map(|(label, value)| SeriesPoint::new(label, value))
        .collect()
}

/// Order two optional values descending, absent values last
pub fn compare_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable descending sort by value
pub fn sort_desc(series: &mut Series) {
    series.sort_by(|a, b| compare_desc(a.value, b.value));
}
