//! The transformation pipeline from a loaded dataset to the dashboard views.
//!
//! Every stage is a pure function of the immutable dataset and the current
//! [`ViewParams`]; views borrow records and never modify them.

pub mod age_band;
pub mod aggregate;
pub mod filter;
pub mod municipality;
pub mod ranking;
pub mod scale;

pub use age_band::order_age_band_series;
pub use aggregate::{aggregate, sort_desc};
pub use filter::{apply_categorical, distinct_values, filter_dimension};
pub use municipality::drop_zero_municipalities;
pub use ranking::{focus_latest_period, rank_top};
pub use scale::{compute_kpis, scale, Kpis};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::export::{preview, table_columns, TablePreview};
use crate::types::{
    Column, Dataset, Dimension, FilterSelection, Metric, Record, Scale, Series, View, ViewParams,
    TABLE_DISPLAY_CAP, TOP_N_MUNICIPALITIES,
};

/// Top municipalities for the most recent period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityRanking {
    /// Period the ranking is restricted to, if the view has one
    pub focus_period: Option<i64>,
    pub entries: Series,
}

/// Every view the presentation layer renders for one set of parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub source_name: String,
    pub rows_loaded: usize,
    pub metric: Metric,
    pub scale: Scale,
    /// Municipalities offered for selection (zero-beneficiary ones excluded)
    pub municipality_options: Vec<String>,
    pub kpis: Kpis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_region: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_age_band: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_municipalities: Option<MunicipalityRanking>,
    pub table: TablePreview,
}

/// Picklist view: categorical filters, then the zero-municipality rule
fn picklist_view<'a>(dataset: &'a Dataset, filters: &FilterSelection) -> View<'a> {
    let view = apply_categorical(&dataset.view(), filters);
    drop_zero_view(dataset, &view)
}

fn drop_zero_view<'a>(dataset: &Dataset, view: &[&'a Record]) -> View<'a> {
    if dataset.has(Column::Municipality) {
        drop_zero_municipalities(view, &dataset.metrics())
    } else {
        view.to_vec()
    }
}

/// Sorted municipality names available after the categorical filters
pub fn municipality_options(dataset: &Dataset, filters: &FilterSelection) -> Vec<String> {
    if !dataset.has(Column::Municipality) {
        return Vec::new();
    }
    distinct_values(&picklist_view(dataset, filters), Dimension::Municipality)
}

/// The filtered view every aggregation works on
pub fn filtered_view<'a>(dataset: &'a Dataset, filters: &FilterSelection) -> View<'a> {
    let view = picklist_view(dataset, filters);
    filter_dimension(&view, Dimension::Municipality, &filters.municipality)
}

/// The filtered table used for display and export.
///
/// The zero-municipality rule is applied again to the final view through the
/// same function, so both call sites drop the same municipalities.
pub fn filtered_table<'a>(dataset: &'a Dataset, filters: &FilterSelection) -> View<'a> {
    let view = filtered_view(dataset, filters);
    drop_zero_view(dataset, &view)
}

/// Series by region, largest first
pub fn region_view(view: &[&Record], metric: Metric, mode: Scale) -> Series {
    let mut series = aggregate(view, Dimension::Region, metric);
    sort_desc(&mut series);
    scale(&series, mode)
}

/// Series by age band in display order, inconsistent band excluded
pub fn age_band_view(view: &[&Record], metric: Metric, mode: Scale) -> Series {
    let series = aggregate(view, Dimension::AgeBand, metric);
    scale(&order_age_band_series(&series), mode)
}

/// Top municipalities of the most recent period
pub fn municipality_view(view: &[&Record], metric: Metric, mode: Scale) -> MunicipalityRanking {
    let (focus_period, focused) = focus_latest_period(view);
    let series = aggregate(&focused, Dimension::Municipality, metric);
    let ranked = rank_top(&series, TOP_N_MUNICIPALITIES);
    MunicipalityRanking {
        focus_period,
        entries: scale(&ranked, mode),
    }
}

/// Run the whole pipeline for one set of parameters
pub fn build_dashboard(dataset: &Dataset, params: &ViewParams) -> Dashboard {
    let view = filtered_view(dataset, &params.filters);
    debug!(
        rows = dataset.len(),
        filtered = view.len(),
        "filters applied"
    );

    let metric_present = dataset.has(params.metric.column());
    let has_view = |column: Column| metric_present && dataset.has(column);

    let by_region =
        has_view(Column::Region).then(|| region_view(&view, params.metric, params.scale));
    let by_age_band =
        has_view(Column::AgeBand).then(|| age_band_view(&view, params.metric, params.scale));
    let top_municipalities = has_view(Column::Municipality)
        .then(|| municipality_view(&view, params.metric, params.scale));

    let table_view = drop_zero_view(dataset, &view);
    let table = preview(&table_view, &table_columns(dataset), TABLE_DISPLAY_CAP);

    Dashboard {
        source_name: dataset.source_name.clone(),
        rows_loaded: dataset.len(),
        metric: params.metric,
        scale: params.scale,
        municipality_options: municipality_options(dataset, &params.filters),
        kpis: compute_kpis(&view),
        by_region,
        by_age_band,
        top_municipalities,
        table,
    }
}
