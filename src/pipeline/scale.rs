use serde::{Deserialize, Serialize};

use crate::types::{Metric, Record, Scale, Series, SeriesPoint};

use super::aggregate::sum_metric;

/// Ratio of `part` to `total`, undefined when the total is absent or not positive
pub fn share(part: Option<f64>, total: Option<f64>) -> Option<f64> {
    match (part, total) {
        (Some(part), Some(total)) if total > 0.0 => Some(part / total),
        _ => None,
    }
}

/// Convert an aggregated series to the requested display scale.
///
/// `Percent` divides each entry by the series total. When that total is not
/// positive (or nothing is present) every entry becomes undefined.
pub fn scale(series: &[SeriesPoint], mode: Scale) -> Series {
    match mode {
        Scale::Count => series.to_vec(),
        Scale::Percent => {
            let total: f64 = series.iter().filter_map(|p| p.value).sum();
            let total = (total > 0.0).then_some(total);
            series
                .iter()
                .map(|p| SeriesPoint::new(p.label.clone(), share(p.value, total)))
                .collect()
        }
    }
}

/// Headline figures for the filtered view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total: f64,
    pub medical: f64,
    pub dental: f64,
    pub pct_medical: Option<f64>,
    pub pct_dental: Option<f64>,
}

impl Kpis {
    /// Build the KPIs from the three sums.
    ///
    /// A share is reported only when the total is positive and the part has
    /// at least one beneficiary; otherwise it is undefined and rendered as a
    /// placeholder.
    pub fn from_sums(total: Option<f64>, medical: Option<f64>, dental: Option<f64>) -> Self {
        let positive = |v: Option<f64>| v.filter(|x| *x > 0.0);
        Self {
            total: total.unwrap_or(0.0),
            medical: medical.unwrap_or(0.0),
            dental: dental.unwrap_or(0.0),
            pct_medical: share(positive(medical), total),
            pct_dental: share(positive(dental), total),
        }
    }
}

/// Compute the KPIs over a filtered view
pub fn compute_kpis(view: &[&Record]) -> Kpis {
    Kpis::from_sums(
        sum_metric(view, Metric::Total),
        sum_metric(view, Metric::Medical),
        sum_metric(view, Metric::Dental),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[Option<f64>]) -> Series {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint::new(format!("g{}", i), *v))
            .collect()
    }

    #[test]
    fn test_count_is_identity() {
        let input = series(&[Some(1.0), None, Some(3.0)]);
        assert_eq!(scale(&input, Scale::Count), input);
    }

    #[test]
    fn test_percent_sums_to_one() {
        let input = series(&[Some(1.0), Some(3.0), Some(6.0), Some(0.0)]);
        let scaled = scale(&input, Scale::Percent);

        let sum: f64 = scaled.iter().map(|p| p.value.unwrap()).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(scaled[2].value, Some(0.6));
        assert_eq!(scaled[3].value, Some(0.0));
    }

    #[test]
    fn test_percent_all_zero_is_undefined() {
        let scaled = scale(&series(&[Some(0.0), Some(0.0)]), Scale::Percent);
        assert!(scaled.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_percent_all_absent_is_undefined() {
        let scaled = scale(&series(&[None, None]), Scale::Percent);
        assert!(scaled.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_percent_empty_series() {
        assert!(scale(&[], Scale::Percent).is_empty());
    }

    #[test]
    fn test_share() {
        assert_eq!(share(Some(1.0), Some(4.0)), Some(0.25));
        assert_eq!(share(Some(1.0), Some(0.0)), None);
        assert_eq!(share(Some(1.0), None), None);
        assert_eq!(share(None, Some(4.0)), None);
    }

    #[test]
    fn test_kpi_percentages() {
        let kpis = Kpis::from_sums(Some(1000.0), Some(300.0), Some(0.0));
        assert!((kpis.pct_medical.unwrap() - 0.30).abs() < 1e-12);
        assert_eq!(kpis.pct_dental, None);
        assert_eq!(kpis.dental, 0.0);
    }

    #[test]
    fn test_kpi_zero_total() {
        let kpis = Kpis::from_sums(Some(0.0), Some(0.0), None);
        assert_eq!(kpis.pct_medical, None);
        assert_eq!(kpis.pct_dental, None);
    }
}
