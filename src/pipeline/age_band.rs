//! Display ordering of age-band labels.
//!
//! Labels are sorted by the first age they mention. "Up to 1 year" comes first,
//! the open-ended "80 or more" band last among the numbered bands, and labels
//! without any number after everything else.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::SeriesPoint;

/// Sort key of the youngest band
pub const YOUNGEST_KEY: i64 = -1;

/// Sort key of the open-ended oldest band
pub const OLDEST_KEY: i64 = 80;

/// Sort key of labels with no age in them
pub const UNKNOWN_KEY: i64 = 9999;

/// Marker of the age band that collects invalid ages
const INCONSISTENT_MARKER: &str = "inconsistent";

/// Markers of an open-ended band
const OPEN_ENDED_MARKERS: &[&str] = &["mais", "or more", "+"];

static YOUNGEST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(até|ate|up to)\s*1\s*(ano|year)").unwrap());

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Whether a label is the "inconsistent age" band (case-insensitive)
pub fn is_inconsistent(label: &str) -> bool {
    label.to_lowercase().contains(INCONSISTENT_MARKER)
}

/// Sort key of an age-band label
pub fn age_band_sort_key(label: &str) -> i64 {
    let lower = label.trim().to_lowercase();

    if YOUNGEST_PATTERN.is_match(&lower) {
        return YOUNGEST_KEY;
    }
    if lower.contains("80") && OPEN_ENDED_MARKERS.iter().any(|m| lower.contains(m)) {
        return OLDEST_KEY;
    }

    FIRST_NUMBER
        .find(&lower)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(UNKNOWN_KEY)
}

/// Drop inconsistent labels and order the rest by their sort key.
///
/// The sort is stable, so labels sharing a key keep their input order. This
/// decides between a plain "80" band and "80 or more".
pub fn order_age_bands(labels: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = labels
        .iter()
        .filter(|l| !is_inconsistent(l))
        .cloned()
        .collect();
    kept.sort_by_key(|l| age_band_sort_key(l));
    kept
}

/// Same ordering applied to an aggregated series with unique labels
pub fn order_age_band_series(series: &[SeriesPoint]) -> Vec<SeriesPoint> {
    let labels: Vec<String> = series.iter().map(|p| p.label.clone()).collect();
    order_age_bands(&labels)
        .into_iter()
        .filter_map(|label| series.iter().find(|p| p.label == label).cloned())
        .collect()
}
