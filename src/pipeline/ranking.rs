use crate::types::{Record, Series, SeriesPoint, View};

use super::aggregate::compare_desc;

/// Highest period present in the view
pub fn latest_period(view: &[&Record]) -> Option<i64> {
    view.iter().filter_map(|r| r.period).max()
}

/// Restrict the view to its most recent period.
///
/// Without any valid period the whole view is returned and the focus is `None`.
pub fn focus_latest_period<'a>(view: &[&'a Record]) -> (Option<i64>, View<'a>) {
    match latest_period(view) {
        Some(period) => {
            let focused = view
                .iter()
                .copied()
                .filter(|r| r.period == Some(period))
                .collect();
            (Some(period), focused)
        }
        None => (None, view.to_vec()),
    }
}

/// Top `n` entries by value, descending.
///
/// Absent and non-positive entries are excluded first; ties keep their input
/// order.
pub fn rank_top(series: &[SeriesPoint], n: usize) -> Series {
    let mut ranked: Series = series
        .iter()
        .filter(|p| p.value.is_some_and(|v| v > 0.0))
        .cloned()
        .collect();
    ranked.sort_by(|a, b| compare_desc(a.value, b.value));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::aggregate::aggregate;
    use crate::types::{Dimension, Metric, TOP_N_MUNICIPALITIES};

    #[test]
    fn test_rank_top_excludes_non_positive() {
        let series = vec![
            SeriesPoint::new("a", Some(0.0)),
            SeriesPoint::new("b", Some(5.0)),
            SeriesPoint::new("c", None),
            SeriesPoint::new("d", Some(7.0)),
        ];
        let ranked = rank_top(&series, 20);
        assert_eq!(
            ranked,
            vec![SeriesPoint::new("d", Some(7.0)), SeriesPoint::new("b", Some(5.0))]
        );
    }

    #[test]
    fn test_rank_top_ties_keep_input_order() {
        let series = vec![
            SeriesPoint::new("x", Some(2.0)),
            SeriesPoint::new("y", Some(2.0)),
            SeriesPoint::new("z", Some(3.0)),
        ];
        let labels: Vec<String> = rank_top(&series, 3).into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_focus_without_period_uses_whole_view() {
        let records = vec![Record::default(), Record::default()];
        let view: View = records.iter().collect();
        let (focus, focused) = focus_latest_period(&view);
        assert_eq!(focus, None);
        assert_eq!(focused.len(), 2);
    }

    #[test]
    fn test_top_twenty_from_latest_period() {
        let mut records: Vec<Record> = (1..=25)
            .map(|i| Record {
                period: Some(2023),
                municipality: format!("Cidade {:02}", i),
                total: Some(i as f64 * 10.0),
                ..Record::default()
            })
            .collect();
        // Older rows that would dominate the ranking if not excluded
        records.extend((1..=5).map(|i| Record {
            period: Some(2022),
            municipality: format!("Antiga {}", i),
            total: Some(100_000.0),
            ..Record::default()
        }));
        let view: View = records.iter().collect();

        let (focus, focused) = focus_latest_period(&view);
        assert_eq!(focus, Some(2023));

        let series = aggregate(&focused, Dimension::Municipality, Metric::Total);
        let ranked = rank_top(&series, TOP_N_MUNICIPALITIES);

        assert_eq!(ranked.len(), 20);
        assert!(ranked.iter().all(|p| p.label.starts_with("Cidade")));
        assert!(ranked.iter().all(|p| p.value.unwrap() > 0.0));
        assert!(ranked.windows(2).all(|w| w[0].value >= w[1].value));
        assert_eq!(ranked[0].label, "Cidade 25");
        assert_eq!(ranked[19].label, "Cidade 06");
    }
}
