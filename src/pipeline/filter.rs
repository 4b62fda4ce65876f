use crate::types::{Dimension, FilterSelection, Record, Selection, View};

/// Keep the records whose value for `dimension` is allowed by `selection`
pub fn filter_dimension<'a>(
    view: &[&'a Record],
    dimension: Dimension,
    selection: &Selection,
) -> View<'a> {
    if selection.is_all() {
        return view.to_vec();
    }
    view.iter()
        .copied()
        .filter(|r| selection.allows(r.category(dimension)))
        .collect()
}

/// Apply the region, sex and age-band selections
pub fn apply_categorical<'a>(view: &[&'a Record], selection: &FilterSelection) -> View<'a> {
    view.iter()
        .copied()
        .filter(|r| {
            selection.region.allows(&r.region)
                && selection.sex.allows(&r.sex)
                && selection.age_band.allows(&r.age_band)
        })
        .collect()
}

/// Sorted distinct values of a dimension within a view, for picklists
pub fn distinct_values(view: &[&Record], dimension: Dimension) -> Vec<String> {
    let mut values: Vec<String> = view
        .iter()
        .map(|r| r.category(dimension).to_string())
        .collect();
    values.sort();
    values.dedup();
    values
}
